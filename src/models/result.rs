use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::verdict::Verdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Error,
}

/// Structured outcome of one validation run, as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub run_id: String,
    pub status: RunStatus,
    pub verdict: Verdict,
    /// APPROVE or NEEDS_REVIEW for completed runs; absent on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Verdict>,
    pub sandbox_path: PathBuf,
    /// Whether the sandbox is still on disk for inspection.
    pub sandbox_retained: bool,
    /// Full evidence transcript text.
    pub test_results: String,
    pub cves_fixed: Vec<String>,
    pub cves_remaining: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
