use std::path::Path;
use tracing::{info, warn};
use crate::config::FixcheckConfig;
use crate::errors::FixcheckError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::StageReport;
use crate::utils::truncate_chars;

/// Sandbox-local target for Python packages, so installs never touch the host environment.
pub const SITE_DIR: &str = ".fixcheck-site";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Npm,
    Pip,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pip => "pip",
        }
    }

    fn command(&self, config: &FixcheckConfig, sandbox: &Path) -> CommandSpec {
        let timeout = config.limits.install_timeout();
        match self {
            Self::Npm => CommandSpec::new(&config.tools.npm, sandbox, timeout).arg("install"),
            Self::Pip => CommandSpec::new(&config.tools.python, sandbox, timeout)
                .args(["-m", "pip", "install", "--target"])
                .arg(sandbox.join(SITE_DIR).to_string_lossy())
                .args(["-r", "requirements.txt"]),
        }
    }
}

/// `package.json` takes precedence over `requirements.txt`.
pub fn detect_ecosystem(sandbox: &Path) -> Option<Ecosystem> {
    if sandbox.join("package.json").is_file() {
        Some(Ecosystem::Npm)
    } else if sandbox.join("requirements.txt").is_file() {
        Some(Ecosystem::Pip)
    } else {
        None
    }
}

/// Resolve dependencies in the sandbox. Success is the exit status alone.
pub async fn install_dependencies(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    sandbox: &Path,
) -> StageReport {
    let Some(ecosystem) = detect_ecosystem(sandbox) else {
        return StageReport::skipped("No dependency manifest found; installation skipped");
    };

    let spec = ecosystem.command(config, sandbox);
    info!(ecosystem = ecosystem.as_str(), command = %spec.display(), "Installing dependencies");

    match runner.run(&spec).await {
        Ok(output) if output.success() => {
            StageReport::succeeded(format!("Dependencies installed successfully ({})", ecosystem.as_str()))
        }
        Ok(output) => {
            let stderr = output.stderr.trim();
            warn!(ecosystem = ecosystem.as_str(), code = ?output.exit_code, "Dependency installation failed");
            StageReport::failed(format!(
                "Dependency installation failed: {}",
                truncate_chars(stderr, config.limits.install_error_chars)
            ))
        }
        Err(FixcheckError::Timeout(_)) => {
            warn!(ecosystem = ecosystem.as_str(), "Dependency installation timed out");
            StageReport::timed_out(format!(
                "Dependency installation timed out after {}s",
                config.limits.install_timeout_secs
            ))
        }
        Err(e) => {
            warn!(ecosystem = ecosystem.as_str(), fault = %e.classify().fault, error = %e, "Dependency installer could not run");
            StageReport::failed(format!("Error installing dependencies: {}", e))
        }
    }
}
