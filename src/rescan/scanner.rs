use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use crate::config::FixcheckConfig;
use crate::errors::FixcheckError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::StageReport;
use crate::utils::{format_list, truncate_chars};

static CVE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"CVE-\d{4}-\d{4,7}").unwrap());

/// Every CVE identifier mentioned anywhere in `text`, deduplicated and sorted.
pub fn extract_identifiers(text: &str) -> BTreeSet<String> {
    CVE_ID.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Before/after comparison of identifier sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierDiff {
    /// In the original report but not in the new scan.
    pub fixed: BTreeSet<String>,
    /// Everything the new scan still reports.
    pub remaining: BTreeSet<String>,
    /// Reported by the new scan but absent from the original report.
    pub introduced: BTreeSet<String>,
}

impl IdentifierDiff {
    pub fn compute(original: &BTreeSet<String>, current: &BTreeSet<String>) -> Self {
        Self {
            fixed: original.difference(current).cloned().collect(),
            remaining: current.clone(),
            introduced: current.difference(original).cloned().collect(),
        }
    }

    pub fn from_texts(original_report: &str, new_scan: &str) -> Self {
        Self::compute(&extract_identifiers(original_report), &extract_identifiers(new_scan))
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "Fix validation: {} CVE(s) fixed, {} remaining. Fixed: {}",
            self.fixed.len(),
            self.remaining.len(),
            format_list(&self.fixed)
        );
        if !self.remaining.is_empty() {
            text.push_str(&format!(" Remaining: {}", format_list(&self.remaining)));
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct RescanOutcome {
    pub report: StageReport,
    /// Absent when the scanner could not produce output.
    pub diff: Option<IdentifierDiff>,
}

/// Scan the sandbox again and compare against the identifiers in `original_report`.
pub async fn rescan(
    runner: &dyn CommandRunner,
    config: &FixcheckConfig,
    sandbox: &Path,
    original_report: &str,
) -> RescanOutcome {
    let Some((program, args)) = config.tools.scanner.split_first() else {
        return RescanOutcome {
            report: StageReport::failed("Error validating fix: no scanner command configured"),
            diff: None,
        };
    };

    let spec = CommandSpec::new(program, sandbox, config.limits.scan_timeout())
        .args(args.iter().cloned())
        .arg(sandbox.to_string_lossy());
    info!(command = %spec.display(), "Re-scanning sandbox");

    let failure = match runner.run(&spec).await {
        Ok(output) if output.success() => {
            let diff = IdentifierDiff::from_texts(original_report, &output.stdout);
            if !diff.introduced.is_empty() {
                warn!(introduced = ?diff.introduced, "Re-scan reports identifiers absent from the original report");
            }
            info!(fixed = diff.fixed.len(), remaining = diff.remaining.len(), "Re-scan complete");
            return RescanOutcome { report: StageReport::succeeded(diff.summary()), diff: Some(diff) };
        }
        Ok(output) => StageReport::failed(format!(
            "Error validating fix: scanner exited with {}: {}",
            output.exit_code.map_or_else(|| "signal".to_string(), |c| format!("status {}", c)),
            truncate_chars(output.stderr.trim(), config.limits.install_error_chars)
        )),
        Err(FixcheckError::Timeout(_)) => StageReport::timed_out(format!(
            "Error validating fix: scan timed out after {}s",
            config.limits.scan_timeout_secs
        )),
        Err(e) => {
            debug!(fault = %e.classify().fault, "Scanner could not run");
            StageReport::failed(format!("Error validating fix: {}", e))
        }
    };

    warn!(detail = %failure.detail, "Re-scan failed");
    RescanOutcome { report: failure, diff: None }
}
