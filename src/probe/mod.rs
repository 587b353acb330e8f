pub mod detect;
pub mod routes;
pub mod startup;
pub mod structure;
pub mod syntax;

use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;
use crate::config::{FixcheckConfig, SandboxConfig};
use crate::exec::CommandRunner;
use crate::models::StageReport;
use crate::utils::format_list;

pub use detect::{detect_app, AppKind, AppProfile, EntryPoint};

/// Sandbox-relative paths of every regular file, skipping excluded directories.
/// Sorted so repeated walks agree.
pub(crate) fn walk_files(root: &Path, config: &SandboxConfig) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !config.is_excluded(&e.file_name().to_string_lossy())
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect()
}

/// Run every sub-check against the sandbox and fold them into one evidence entry.
///
/// Each sub-check absorbs its own faults, so a broken startup never hides the
/// structure summary or the endpoint list.
pub async fn probe_application(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    sandbox: &Path,
) -> StageReport {
    if !sandbox.is_dir() {
        return StageReport::failed(format!(
            "Error during application testing: sandbox {} does not exist",
            sandbox.display()
        ));
    }

    let structure = structure::analyze_structure(sandbox, &config.sandbox);
    let profile = detect_app(sandbox, &config.limits);
    let syntax = syntax::check_syntax(runner, config, sandbox, profile.kind).await;
    let startup = startup::test_startup(runner, config, sandbox, &profile).await;
    let endpoints = routes::discover_endpoints(sandbox, config, profile.kind);

    info!(
        kind = %profile.kind,
        files_checked = syntax.files_checked,
        syntax_errors = syntax.errors.len(),
        "Application probed"
    );

    let detail = format!(
        "Comprehensive test results: App Analysis: {}; Detected: {} app with entry points: {}; Syntax Check: {}; Startup Test: {}; API Test: {}",
        structure,
        profile.kind,
        format_list(profile.entry_points.iter().map(|e| e.to_string())),
        syntax.render(config.limits.max_syntax_samples),
        startup::render(&startup),
        endpoints,
    );

    let failed = !syntax.errors.is_empty() || startup.iter().any(|r| r.status.is_failure());
    let timed_out = startup.iter().any(|r| r.status == startup::StartupStatus::TimedOut);

    if failed {
        StageReport::failed(detail)
    } else if timed_out {
        StageReport::timed_out(detail)
    } else {
        StageReport::succeeded(detail)
    }
}
