pub mod events;
pub mod orchestrator;
pub mod phase;
pub mod state;

pub use events::ValidationEvent;
pub use orchestrator::ValidationOrchestrator;
pub use state::{Stage, ValidationRequest};
