use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixcheckError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sandbox error: {0}")]
    Sandbox(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Dependency not found: {0}")]
    MissingDependency(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for FixcheckError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FixcheckError::Timeout(e.to_string())
        } else {
            FixcheckError::Network(e.to_string())
        }
    }
}

impl From<walkdir::Error> for FixcheckError {
    fn from(e: walkdir::Error) -> Self {
        let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
        match e.into_io_error() {
            Some(io) => FixcheckError::Io(std::io::Error::new(
                io.kind(),
                format!("{}: {}", path, io),
            )),
            None => FixcheckError::Sandbox(format!("Filesystem loop detected at {}", path)),
        }
    }
}
