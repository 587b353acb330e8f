use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use chrono::Utc;
use crate::errors::FixcheckError;
use crate::models::{StageOutcome, Verdict};
use crate::pipeline::state::Stage;
use super::utils::atomic_write;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SessionData {
    pub run_id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub verdict: Option<Verdict>,
    pub stages: BTreeMap<Stage, StageSessionData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StageSessionData {
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_ms: Option<u64>,
    pub outcome: Option<StageOutcome>,
    pub status: String,
}

/// Stage timings persisted as `session.json`, rewritten atomically after every change.
pub struct MetricsTracker {
    path: PathBuf,
    data: SessionData,
}

impl MetricsTracker {
    pub fn new(base_dir: &Path, run_id: &str) -> Self {
        Self {
            path: base_dir.join("session.json"),
            data: SessionData {
                run_id: run_id.to_string(),
                started_at: Utc::now().to_rfc3339(),
                ..Default::default()
            },
        }
    }

    pub fn start_stage(&mut self, stage: Stage) {
        self.data.stages.insert(stage, StageSessionData {
            started_at: Utc::now().to_rfc3339(),
            completed_at: None,
            duration_ms: None,
            outcome: None,
            status: "running".to_string(),
        });
    }

    pub async fn end_stage(&mut self, stage: Stage, outcome: StageOutcome, duration_ms: u64) -> Result<(), FixcheckError> {
        if let Some(entry) = self.data.stages.get_mut(&stage) {
            entry.completed_at = Some(Utc::now().to_rfc3339());
            entry.duration_ms = Some(duration_ms);
            entry.outcome = Some(outcome);
            entry.status = "completed".to_string();
        }
        self.save().await
    }

    pub async fn finish(&mut self, verdict: Verdict) -> Result<(), FixcheckError> {
        self.data.completed_at = Some(Utc::now().to_rfc3339());
        self.data.verdict = Some(verdict);
        self.save().await
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub async fn save(&self) -> Result<(), FixcheckError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        atomic_write(&self.path, &json).await
    }
}
