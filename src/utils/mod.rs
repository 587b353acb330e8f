pub mod formatting;
pub mod paths;
pub mod truncation;

pub use formatting::{format_duration, format_list};
pub use paths::stays_inside;
pub use truncation::truncate_chars;
