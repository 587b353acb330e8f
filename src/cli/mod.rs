pub mod commands;
pub mod validate;
pub mod diff;
pub mod check_config;
pub mod progress;

pub use commands::{Cli, Commands};
