use std::path::{Component, Path};
use crate::config::FixcheckConfig;
use crate::errors::FixcheckError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::install::SITE_DIR;
use crate::utils::{stays_inside, truncate_chars};
use super::detect::{AppKind, AppProfile, EntryPoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupStatus {
    ImportSucceeded,
    ImportFailed,
    SyntaxValid,
    SyntaxInvalid,
    /// Reported only; the command is never executed.
    CommandAvailable,
    NotFound,
    TimedOut,
    Fault(String),
}

impl StartupStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ImportFailed | Self::SyntaxInvalid | Self::Fault(_))
    }
}

impl std::fmt::Display for StartupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportSucceeded => f.write_str("import success"),
            Self::ImportFailed => f.write_str("import failed"),
            Self::SyntaxValid => f.write_str("syntax valid"),
            Self::SyntaxInvalid => f.write_str("syntax invalid"),
            Self::CommandAvailable => f.write_str("command available"),
            Self::NotFound => f.write_str("entry point not found"),
            Self::TimedOut => f.write_str("startup test timed out"),
            Self::Fault(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupResult {
    pub entry_point: EntryPoint,
    pub status: StartupStatus,
}

pub fn render(results: &[StartupResult]) -> String {
    if results.is_empty() {
        return "No startup tests performed".to_string();
    }
    results
        .iter()
        .map(|r| format!("{}: {}", r.entry_point, r.status))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `pkg/app.py` -> `pkg.app`
fn module_name(path: &Path) -> Option<String> {
    let stem = path.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Smoke-test each entry point without running the application.
pub async fn test_startup(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    sandbox: &Path,
    profile: &AppProfile,
) -> Vec<StartupResult> {
    let mut results = Vec::with_capacity(profile.entry_points.len());

    for entry_point in &profile.entry_points {
        let status = match entry_point {
            EntryPoint::Command(_) => StartupStatus::CommandAvailable,
            EntryPoint::File(path) => {
                if !stays_inside(path) {
                    StartupStatus::Fault(format!("entry point {} is outside the sandbox", path.display()))
                } else if !sandbox.join(path).is_file() {
                    StartupStatus::NotFound
                } else {
                    match startup_spec(config, sandbox, profile.kind, path) {
                        Some((spec, is_import)) => run_probe(runner, config, &spec, is_import).await,
                        None => StartupStatus::Fault(format!(
                            "no startup check for {} entry point",
                            profile.kind
                        )),
                    }
                }
            }
        };
        results.push(StartupResult { entry_point: entry_point.clone(), status });
    }

    results
}

fn startup_spec(
    config: &FixcheckConfig,
    sandbox: &Path,
    kind: AppKind,
    path: &Path,
) -> Option<(CommandSpec, bool)> {
    let timeout = config.limits.startup_timeout();
    match kind {
        AppKind::PythonGeneric | AppKind::Flask | AppKind::FastApi | AppKind::Django => {
            let module = module_name(path)?;
            let mut spec = CommandSpec::new(&config.tools.python, sandbox, timeout)
                .arg("-c")
                .arg(format!("import {}", module));
            let site = sandbox.join(SITE_DIR);
            if site.is_dir() {
                spec = spec.env("PYTHONPATH", site.to_string_lossy());
            }
            Some((spec, true))
        }
        AppKind::Node => Some((
            CommandSpec::new(&config.tools.node, sandbox, timeout)
                .arg("--check")
                .arg(path.to_string_lossy()),
            false,
        )),
        AppKind::Unknown => None,
    }
}

async fn run_probe(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    spec: &CommandSpec,
    is_import: bool,
) -> StartupStatus {
    match runner.run(spec).await {
        Ok(output) => match (is_import, output.success()) {
            (true, true) => StartupStatus::ImportSucceeded,
            (true, false) => StartupStatus::ImportFailed,
            (false, true) => StartupStatus::SyntaxValid,
            (false, false) => StartupStatus::SyntaxInvalid,
        },
        Err(FixcheckError::Timeout(_)) => StartupStatus::TimedOut,
        Err(e) => StartupStatus::Fault(
            truncate_chars(&e.to_string(), config.limits.startup_error_chars).to_string(),
        ),
    }
}
