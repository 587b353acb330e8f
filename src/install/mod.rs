pub mod installer;

pub use installer::{detect_ecosystem, install_dependencies, Ecosystem, SITE_DIR};
