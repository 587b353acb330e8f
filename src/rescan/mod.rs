pub mod scanner;

pub use scanner::{extract_identifiers, rescan, IdentifierDiff, RescanOutcome};
