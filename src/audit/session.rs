use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::errors::FixcheckError;
use crate::models::{StageReport, ValidationResult};
use crate::pipeline::state::Stage;
use crate::utils::{format_duration, truncate_chars};
use super::workflow_logger::WorkflowLogger;
use super::metrics_tracker::MetricsTracker;
use super::utils::atomic_write;

/// Per-run audit directory: `workflow.log`, `session.json` and the final `result.json`.
pub struct AuditSession {
    base_dir: PathBuf,
    run_id: String,
    metrics: Arc<Mutex<MetricsTracker>>,
    workflow_logger: Arc<Mutex<WorkflowLogger>>,
}

impl AuditSession {
    pub async fn initialize(output_dir: &Path, run_id: &str) -> Result<Self, FixcheckError> {
        let base_dir = output_dir.join(run_id);
        tokio::fs::create_dir_all(&base_dir).await?;

        let metrics = MetricsTracker::new(&base_dir, run_id);
        metrics.save().await?;
        let workflow_logger = WorkflowLogger::new(&base_dir);
        workflow_logger.initialize(run_id).await?;

        Ok(Self {
            base_dir,
            run_id: run_id.to_string(),
            metrics: Arc::new(Mutex::new(metrics)),
            workflow_logger: Arc::new(Mutex::new(workflow_logger)),
        })
    }

    pub async fn start_stage(&self, stage: Stage) -> Result<(), FixcheckError> {
        self.metrics.lock().await.start_stage(stage);
        self.workflow_logger.lock().await
            .log_event(&format!("Stage {} started", stage.display_name())).await
    }

    pub async fn end_stage(
        &self,
        stage: Stage,
        report: &StageReport,
        duration_ms: u64,
    ) -> Result<(), FixcheckError> {
        self.metrics.lock().await.end_stage(stage, report.outcome, duration_ms).await?;
        self.workflow_logger.lock().await
            .log_event(&format!(
                "Stage {} {} in {}: {}",
                stage.display_name(),
                report.outcome,
                format_duration(duration_ms),
                truncate_chars(&report.detail, 300),
            )).await
    }

    pub async fn log(&self, message: &str) -> Result<(), FixcheckError> {
        self.workflow_logger.lock().await.log_event(message).await
    }

    pub async fn finish(&self, result: &ValidationResult) -> Result<(), FixcheckError> {
        self.metrics.lock().await.finish(result.verdict).await?;
        let json = serde_json::to_string_pretty(result)?;
        atomic_write(&self.base_dir.join("result.json"), &json).await?;
        self.workflow_logger.lock().await
            .log_event(&format!("Run finished with verdict {}", result.verdict)).await
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}
