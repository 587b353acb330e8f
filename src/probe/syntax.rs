use std::path::{Path, PathBuf};
use tracing::debug;
use crate::config::FixcheckConfig;
use crate::errors::FixcheckError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::utils::{format_list, truncate_chars};
use super::detect::AppKind;
use super::walk_files;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxSummary {
    pub files_checked: usize,
    /// `path: message` per failing file, in walk order.
    pub errors: Vec<String>,
    pub skipped: bool,
}

impl SyntaxSummary {
    pub fn render(&self, max_samples: usize) -> String {
        if self.skipped {
            return "skipped for unknown app type".to_string();
        }
        if self.errors.is_empty() {
            format!("{} errors found - all clean", self.errors.len())
        } else {
            let samples: Vec<&String> = self.errors.iter().take(max_samples).collect();
            format!("{} errors found - {}", self.errors.len(), format_list(samples))
        }
    }
}

fn checker(kind: AppKind, config: &FixcheckConfig) -> Option<(&'static str, Vec<String>)> {
    if kind.is_python() {
        Some(("py", vec![config.tools.python.clone(), "-m".into(), "py_compile".into()]))
    } else if kind == AppKind::Node {
        Some(("js", vec![config.tools.node.clone(), "--check".into()]))
    } else {
        None
    }
}

/// Compile-check every source file of the detected language, one process per file.
pub async fn check_syntax(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    sandbox: &Path,
    kind: AppKind,
) -> SyntaxSummary {
    let Some((extension, command)) = checker(kind, config) else {
        return SyntaxSummary { skipped: true, ..Default::default() };
    };
    let limit = config.limits.syntax_error_chars;

    let files: Vec<PathBuf> = walk_files(sandbox, &config.sandbox)
        .into_iter()
        .filter(|f| f.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();

    let mut summary = SyntaxSummary::default();
    for file in files {
        let spec = CommandSpec::new(&command[0], sandbox, config.limits.syntax_timeout())
            .args(command[1..].iter().cloned())
            .arg(file.to_string_lossy());

        summary.files_checked += 1;
        let failure = match runner.run(&spec).await {
            Ok(output) if output.success() => None,
            Ok(output) => Some(truncate_chars(output.stderr.trim(), limit).to_string()),
            Err(FixcheckError::Timeout(_)) => Some("timed out".to_string()),
            Err(e) => Some(truncate_chars(&e.to_string(), limit).to_string()),
        };
        if let Some(message) = failure {
            debug!(file = %file.display(), "Syntax check failed");
            summary.errors.push(format!("{}: {}", file.display(), message));
        }
    }
    summary
}
