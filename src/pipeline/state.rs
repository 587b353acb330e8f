use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::fix::FixDescriptor;
use crate::models::Recommendation;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Provision,
    Apply,
    Install,
    Probe,
    Rescan,
}

impl Stage {
    pub fn display_name(&self) -> &'static str {
        super::phase::definition(*self).display_name
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provision => write!(f, "provision"),
            Self::Apply => write!(f, "apply"),
            Self::Install => write!(f, "install"),
            Self::Probe => write!(f, "probe"),
            Self::Rescan => write!(f, "rescan"),
        }
    }
}

/// Everything one validation run needs from its caller.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub repo_path: PathBuf,
    /// Text of the original vulnerability report; identifiers are extracted from it.
    pub vulnerability_report: String,
    pub fixes: Vec<FixDescriptor>,
    pub recommendation: Option<Recommendation>,
    /// Overrides the generated sandbox location.
    pub sandbox_path: Option<PathBuf>,
}

impl ValidationRequest {
    pub fn new(repo_path: impl Into<PathBuf>, vulnerability_report: impl Into<String>) -> Self {
        Self {
            repo_path: repo_path.into(),
            vulnerability_report: vulnerability_report.into(),
            fixes: Vec::new(),
            recommendation: None,
            sandbox_path: None,
        }
    }

    pub fn with_fixes(mut self, fixes: Vec<FixDescriptor>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn with_recommendation(mut self, recommendation: Option<Recommendation>) -> Self {
        self.recommendation = recommendation;
        self
    }

    pub fn with_sandbox_path(mut self, path: Option<PathBuf>) -> Self {
        self.sandbox_path = path;
        self
    }

    /// Final path component of the repository, used to name published reports.
    pub fn repo_name(&self) -> String {
        self.repo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Provision.to_string(), "provision");
        assert_eq!(Stage::Rescan.display_name(), "Vulnerability Re-Scan");
    }

    #[test]
    fn test_repo_name_is_last_component() {
        let request = ValidationRequest::new("/tmp/downloads/my-service", "");
        assert_eq!(request.repo_name(), "my-service");
        let request = ValidationRequest::new("/", "");
        assert_eq!(request.repo_name(), "repository");
    }
}
