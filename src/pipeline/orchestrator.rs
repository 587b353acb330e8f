use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use crate::audit::AuditSession;
use crate::config::FixcheckConfig;
use crate::errors::FixcheckError;
use crate::exec::CommandRunner;
use crate::fix::apply_fixes;
use crate::install::install_dependencies;
use crate::models::{
    EvidenceTranscript, Recommendation, RunStatus, StageReport, ValidationResult, Verdict,
};
use crate::probe::probe_application;
use crate::rescan::{rescan, IdentifierDiff};
use crate::sandbox;
use super::events::ValidationEvent;
use super::state::{Stage, ValidationRequest};

/// Sequences the five stages against one sandbox and derives the verdict.
///
/// Stages never abort the run: each one appends exactly one evidence entry and the next
/// stage starts regardless. Only failing to set up the sandbox directory ends in ERROR.
pub struct ValidationOrchestrator {
    config: Arc<FixcheckConfig>,
    runner: Arc<dyn CommandRunner>,
    event_tx: Option<mpsc::UnboundedSender<ValidationEvent>>,
    audit_dir: Option<PathBuf>,
    keep_sandbox: bool,
}

/// Mutable state owned by a single run.
struct RunContext {
    transcript: EvidenceTranscript,
    audit: Option<AuditSession>,
}

impl ValidationOrchestrator {
    pub fn new(config: Arc<FixcheckConfig>, runner: Arc<dyn CommandRunner>) -> Self {
        let keep_sandbox = config.sandbox.keep;
        Self {
            config,
            runner,
            event_tx: None,
            audit_dir: None,
            keep_sandbox,
        }
    }

    /// Attach an event channel for streaming progress to a display.
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<ValidationEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Write `workflow.log`, `session.json` and `result.json` under `dir/<run id>/`.
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    /// Leave the sandbox on disk after the run.
    pub fn with_keep_sandbox(mut self, keep: bool) -> Self {
        self.keep_sandbox = self.keep_sandbox || keep;
        self
    }

    fn emit(&self, event: ValidationEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    pub async fn run(&self, request: ValidationRequest) -> ValidationResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let audit = match &self.audit_dir {
            Some(dir) => match AuditSession::initialize(dir, &run_id).await {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(error = %e, dir = %dir.display(), "Audit trail disabled for this run");
                    None
                }
            },
            None => None,
        };
        let mut ctx = RunContext { transcript: EvidenceTranscript::new(), audit };

        let sandbox_path = match self.prepare_sandbox(&request).await {
            Ok(path) => path,
            Err(e) => {
                error!(error = %e, fault = %e.classify().fault, "Sandbox could not be allocated");
                let result = ValidationResult {
                    run_id,
                    status: RunStatus::Error,
                    verdict: Verdict::Error,
                    recommendation: None,
                    sandbox_path: request.sandbox_path.clone().unwrap_or_default(),
                    sandbox_retained: false,
                    test_results: ctx.transcript.render(),
                    cves_fixed: Vec::new(),
                    cves_remaining: Vec::new(),
                    error: Some(e.to_string()),
                    started_at,
                    finished_at: Utc::now(),
                };
                self.finish(&ctx, &result, clock).await;
                return result;
            }
        };

        info!(run_id = %run_id, sandbox = %sandbox_path.display(), repo = %request.repo_path.display(), "Validation started");
        self.emit(ValidationEvent::RunStarted {
            run_id: run_id.clone(),
            sandbox_path: sandbox_path.display().to_string(),
        });

        let runner = self.runner.as_ref();
        let config = self.config.as_ref();
        let sandbox_dir = sandbox_path.as_path();

        self.stage(&mut ctx, Stage::Provision, sandbox::provision(&request.repo_path, sandbox_dir)).await;
        self.stage(&mut ctx, Stage::Apply, apply_fixes(sandbox_dir, &request.fixes)).await;
        self.stage(&mut ctx, Stage::Install, install_dependencies(runner, config, sandbox_dir)).await;
        self.stage(&mut ctx, Stage::Probe, probe_application(runner, config, sandbox_dir)).await;

        let mut diff: Option<IdentifierDiff> = None;
        self.stage(&mut ctx, Stage::Rescan, async {
            let outcome = rescan(runner, config, sandbox_dir, &request.vulnerability_report).await;
            diff = outcome.diff;
            outcome.report
        }).await;

        let recommendation = self.resolve_recommendation(&request);
        let verdict = Verdict::from_recommendation(recommendation);

        let sandbox_retained = if self.keep_sandbox {
            info!(sandbox = %sandbox_path.display(), "Sandbox retained for inspection");
            true
        } else {
            !sandbox::cleanup(sandbox_dir).await
        };

        let diff = diff.unwrap_or_default();
        let result = ValidationResult {
            run_id,
            status: RunStatus::Completed,
            verdict,
            recommendation: Some(verdict),
            sandbox_path,
            sandbox_retained,
            test_results: ctx.transcript.render(),
            cves_fixed: diff.fixed.into_iter().collect(),
            cves_remaining: diff.remaining.into_iter().collect(),
            error: None,
            started_at,
            finished_at: Utc::now(),
        };

        info!(verdict = %result.verdict, fixed = result.cves_fixed.len(), remaining = result.cves_remaining.len(), "Validation finished");
        self.finish(&ctx, &result, clock).await;
        result
    }

    /// Allocate the sandbox, refusing locations that would put the repository at risk.
    async fn prepare_sandbox(&self, request: &ValidationRequest) -> Result<PathBuf, FixcheckError> {
        if let Some(explicit) = &request.sandbox_path {
            if overlaps(&request.repo_path, explicit) {
                return Err(FixcheckError::InvalidInput(format!(
                    "Sandbox path {} overlaps the repository {}",
                    explicit.display(),
                    request.repo_path.display()
                )));
            }
        }
        sandbox::allocate(&self.config.sandbox, request.sandbox_path.as_deref()).await
    }

    /// Typed recommendation first; the text search over the report is a fallback that
    /// can be switched off in configuration.
    fn resolve_recommendation(&self, request: &ValidationRequest) -> Option<Recommendation> {
        if request.recommendation.is_some() || !self.config.verdict.legacy_token_match {
            return request.recommendation;
        }
        let parsed = Recommendation::from_upstream_text(&request.vulnerability_report);
        if let Some(rec) = parsed {
            warn!(
                recommendation = ?rec,
                "Recommendation inferred from report text; any mention of the token counts"
            );
        }
        parsed
    }

    async fn stage<F>(&self, ctx: &mut RunContext, stage: Stage, work: F)
    where
        F: Future<Output = StageReport>,
    {
        let started = Instant::now();
        self.emit(ValidationEvent::StageStarted {
            stage,
            display_name: stage.display_name().to_string(),
        });
        if let Some(audit) = &ctx.audit {
            if let Err(e) = audit.start_stage(stage).await {
                warn!(error = %e, "Failed to write audit entry");
            }
        }

        let report = work.await;
        let duration_ms = started.elapsed().as_millis() as u64;
        info!(stage = %stage, outcome = %report.outcome, duration_ms, "Stage finished");

        if let Some(audit) = &ctx.audit {
            if let Err(e) = audit.end_stage(stage, &report, duration_ms).await {
                warn!(error = %e, "Failed to write audit entry");
            }
        }
        self.emit(ValidationEvent::StageCompleted { stage, outcome: report.outcome, duration_ms });
        ctx.transcript.record(stage, report);
    }

    async fn finish(&self, ctx: &RunContext, result: &ValidationResult, clock: Instant) {
        if let Some(audit) = &ctx.audit {
            if let Err(e) = audit.finish(result).await {
                warn!(error = %e, "Failed to write audit result");
            }
        }
        self.emit(ValidationEvent::RunCompleted {
            verdict: result.verdict,
            duration_ms: clock.elapsed().as_millis() as u64,
        });
    }
}

/// True when either path contains the other.
fn overlaps(repo: &Path, sandbox: &Path) -> bool {
    let resolve = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
    let (repo, sandbox) = (resolve(repo), resolve(sandbox));
    repo.starts_with(&sandbox) || sandbox.starts_with(&repo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{CommandOutput, CommandSpec};
    use crate::fix::FixDescriptor;
    use async_trait::async_trait;

    struct QuietRunner;

    #[async_trait]
    impl CommandRunner for QuietRunner {
        async fn run(&self, _spec: &CommandSpec) -> Result<CommandOutput, FixcheckError> {
            Ok(CommandOutput::ok(""))
        }
    }

    fn orchestrator(root: &Path) -> ValidationOrchestrator {
        let mut config = FixcheckConfig::default();
        config.sandbox.root = Some(root.to_path_buf());
        ValidationOrchestrator::new(Arc::new(config), Arc::new(QuietRunner))
    }

    #[tokio::test]
    async fn test_every_stage_appends_one_entry() {
        let repo = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("main.py"), "print('hi')\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = ValidationRequest::new(repo.path(), "CVE-2023-0001")
            .with_fixes(vec![FixDescriptor::bump("lodash", "4.17.21")]);
        let result = orchestrator(root.path()).with_event_channel(tx).run(request).await;

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.verdict, Verdict::NeedsReview);
        let lines: Vec<&str> = result.test_results.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].contains("Failed to bump lodash@4.17.21"));
        assert_eq!(result.cves_fixed, vec!["CVE-2023-0001"]);
        assert!(!result.sandbox_retained);
        assert!(!result.sandbox_path.exists());

        let mut completed = 0;
        while let Ok(event) = rx.try_recv() {
            if let ValidationEvent::StageCompleted { .. } = event {
                completed += 1;
            }
        }
        assert_eq!(completed, 5);
    }

    #[tokio::test]
    async fn test_typed_recommendation_wins_over_text() {
        let repo = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let request = ValidationRequest::new(repo.path(), "Recommendation: APPROVE")
            .with_recommendation(Some(Recommendation::Reject));
        let result = orchestrator(root.path()).run(request).await;
        assert_eq!(result.verdict, Verdict::NeedsReview);
    }

    #[tokio::test]
    async fn test_legacy_token_ignores_reject_mentions() {
        let repo = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let result = orchestrator(root.path())
            .run(ValidationRequest::new(repo.path(), "Recommendation: APPROVE (earlier draft said REJECT)"))
            .await;
        assert_eq!(result.verdict, Verdict::Approve);
        assert_eq!(result.recommendation, Some(Verdict::Approve));
    }

    #[tokio::test]
    async fn test_legacy_token_match_can_be_disabled() {
        let repo = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();

        let result = orchestrator(root.path())
            .run(ValidationRequest::new(repo.path(), "Recommendation: APPROVE"))
            .await;
        assert_eq!(result.verdict, Verdict::Approve);

        let mut config = FixcheckConfig::default();
        config.sandbox.root = Some(root.path().to_path_buf());
        config.verdict.legacy_token_match = false;
        let result = ValidationOrchestrator::new(Arc::new(config), Arc::new(QuietRunner))
            .run(ValidationRequest::new(repo.path(), "Recommendation: APPROVE"))
            .await;
        assert_eq!(result.verdict, Verdict::NeedsReview);
    }

    #[tokio::test]
    async fn test_sandbox_inside_repo_is_refused() {
        let repo = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("app.py"), "x = 1\n").unwrap();
        let request = ValidationRequest::new(repo.path(), "")
            .with_sandbox_path(Some(repo.path().to_path_buf()));

        let result = orchestrator(repo.path()).run(request).await;
        assert_eq!(result.status, RunStatus::Error);
        assert!(!result.is_completed());
        assert_eq!(result.verdict, Verdict::Error);
        assert!(result.recommendation.is_none());
        assert!(repo.path().join("app.py").exists());
    }

    #[tokio::test]
    async fn test_keep_sandbox_retains_copy() {
        let repo = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        std::fs::write(repo.path().join("README.md"), "# demo\n").unwrap();

        let result = orchestrator(root.path())
            .with_keep_sandbox(true)
            .run(ValidationRequest::new(repo.path(), ""))
            .await;
        assert!(result.sandbox_retained);
        assert!(result.sandbox_path.join("README.md").exists());
        assert_eq!(
            result.test_results.lines().next().map(|l| l.starts_with("[Sandbox Provisioning]")),
            Some(true)
        );
    }
}
