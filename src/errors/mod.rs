pub mod types;
pub mod classification;
pub mod retry;

pub use types::FixcheckError;
pub use classification::{ErrorClassification, FaultClass};
pub use retry::{RetryConfig, with_retry};
