use super::state::Stage;
use crate::models::{StageOutcome, Verdict};

/// Progress messages sent from the orchestrator to a display or other consumer.
#[derive(Debug, Clone)]
pub enum ValidationEvent {
    /// The sandbox was allocated and the run is starting
    RunStarted {
        run_id: String,
        sandbox_path: String,
    },
    StageStarted {
        stage: Stage,
        display_name: String,
    },
    StageCompleted {
        stage: Stage,
        outcome: StageOutcome,
        duration_ms: u64,
    },
    /// The run ended; `Verdict::Error` when setup failed
    RunCompleted {
        verdict: Verdict,
        duration_ms: u64,
    },
}
