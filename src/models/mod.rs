pub mod evidence;
pub mod result;
pub mod verdict;

pub use evidence::*;
pub use result::*;
pub use verdict::*;
