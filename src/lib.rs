pub mod audit;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fix;
pub mod install;
pub mod models;
pub mod pipeline;
pub mod probe;
pub mod reporting;
pub mod rescan;
pub mod sandbox;
pub mod utils;

pub use errors::FixcheckError;
pub use models::{ValidationResult, Verdict};
pub use pipeline::{ValidationOrchestrator, ValidationRequest};
