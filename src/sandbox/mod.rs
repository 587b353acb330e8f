pub mod provisioner;

pub use provisioner::{allocate, cleanup, provision};
