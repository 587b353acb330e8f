use serde::{Deserialize, Serialize};
use crate::pipeline::state::Stage;

/// How a stage ended. Stages never abort the run; this only colours the evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed,
    TimedOut,
    Skipped,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single stage hands back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub outcome: StageOutcome,
    pub detail: String,
}

impl StageReport {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        Self { outcome: StageOutcome::Succeeded, detail: detail.into() }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self { outcome: StageOutcome::Failed, detail: detail.into() }
    }

    pub fn timed_out(detail: impl Into<String>) -> Self {
        Self { outcome: StageOutcome::TimedOut, detail: detail.into() }
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self { outcome: StageOutcome::Skipped, detail: detail.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub detail: String,
}

/// Append-only, ordered record of stage results for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceTranscript {
    entries: Vec<EvidenceEntry>,
}

impl EvidenceTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage, report: StageReport) {
        self.entries.push(EvidenceEntry {
            stage,
            outcome: report.outcome,
            detail: report.detail,
        });
    }

    pub fn entries(&self) -> &[EvidenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, stage: Stage) -> Option<&EvidenceEntry> {
        self.entries.iter().find(|e| e.stage == stage)
    }

    /// One line per stage, in the order the stages ran.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("[{}] {}", e.stage.display_name(), e.detail))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_preserves_order() {
        let mut transcript = EvidenceTranscript::new();
        transcript.record(Stage::Provision, StageReport::succeeded("copied"));
        transcript.record(Stage::Apply, StageReport::failed("Package left-pad not found in dependencies"));
        transcript.record(Stage::Install, StageReport::timed_out("npm install timed out after 300s"));

        let stages: Vec<Stage> = transcript.entries().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![Stage::Provision, Stage::Apply, Stage::Install]);
        assert_eq!(transcript.entry(Stage::Install).unwrap().outcome, StageOutcome::TimedOut);
    }

    #[test]
    fn test_render_one_line_per_stage() {
        let mut transcript = EvidenceTranscript::new();
        transcript.record(Stage::Provision, StageReport::succeeded("Repository copied to sandbox: /tmp/x"));
        transcript.record(Stage::Rescan, StageReport::succeeded("Fix validation: 1 CVE(s) fixed, 0 remaining."));
        let rendered = transcript.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[Sandbox Provisioning]"));
        assert!(lines[1].contains("1 CVE(s) fixed"));
    }

    #[test]
    fn test_empty_transcript() {
        let transcript = EvidenceTranscript::new();
        assert!(transcript.is_empty());
        assert_eq!(transcript.render(), "");
    }
}
