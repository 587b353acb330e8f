pub mod formatter;
pub mod publisher;

pub use formatter::{format_report, title_case};
pub use publisher::{
    build_store, object_key, publish_report, HttpObjectStore, LocalObjectStore, ObjectStore,
};
