pub mod runner;

pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
