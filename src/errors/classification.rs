use super::types::FixcheckError;

/// Broad fault families a validation stage can run into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Missing or unwritable paths, copy failures.
    Io,
    /// Non-zero exit, timeout, missing executable.
    Subprocess,
    /// Malformed manifest or unreadable source.
    Parse,
    /// Referenced dependency absent from the manifest.
    Contract,
    /// Anything raised outside the stage boundaries.
    Operational,
}

impl FaultClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::Subprocess => "subprocess",
            Self::Parse => "parse",
            Self::Contract => "contract",
            Self::Operational => "operational",
        }
    }
}

impl std::fmt::Display for FaultClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    pub fault: FaultClass,
    pub retryable: bool,
}

impl FixcheckError {
    /// Classify this error to determine its fault family and whether it can be retried.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Retryable errors
            FixcheckError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                fault: FaultClass::Operational,
                retryable: true,
            },
            FixcheckError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                fault: FaultClass::Subprocess,
                retryable: true,
            },
            FixcheckError::Storage(_) => ErrorClassification {
                error_type: "StorageError",
                fault: FaultClass::Operational,
                retryable: true,
            },
            FixcheckError::Io(_) => ErrorClassification {
                error_type: "IoError",
                fault: FaultClass::Io,
                retryable: true,
            },

            // Non-retryable errors
            FixcheckError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                fault: FaultClass::Operational,
                retryable: false,
            },
            FixcheckError::InvalidInput(_) => ErrorClassification {
                error_type: "InvalidInputError",
                fault: FaultClass::Operational,
                retryable: false,
            },
            FixcheckError::Sandbox(_) => ErrorClassification {
                error_type: "SandboxError",
                fault: FaultClass::Io,
                retryable: false,
            },
            FixcheckError::Process(_) => ErrorClassification {
                error_type: "ProcessError",
                fault: FaultClass::Subprocess,
                retryable: false,
            },
            FixcheckError::Manifest(_) => ErrorClassification {
                error_type: "ManifestError",
                fault: FaultClass::Parse,
                retryable: false,
            },
            FixcheckError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                fault: FaultClass::Parse,
                retryable: false,
            },
            FixcheckError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                fault: FaultClass::Parse,
                retryable: false,
            },
            FixcheckError::MissingDependency(_) => ErrorClassification {
                error_type: "MissingDependencyError",
                fault: FaultClass::Contract,
                retryable: false,
            },
            FixcheckError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                fault: FaultClass::Operational,
                retryable: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_retryable() {
        let err = FixcheckError::Network("connection refused".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.error_type, "NetworkError");
    }

    #[test]
    fn test_timeout_is_subprocess_fault() {
        let err = FixcheckError::Timeout("npm install".into());
        let class = err.classify();
        assert!(class.retryable);
        assert_eq!(class.fault, FaultClass::Subprocess);
    }

    #[test]
    fn test_missing_dependency_is_contract_fault() {
        let err = FixcheckError::MissingDependency("lodash".into());
        let class = err.classify();
        assert!(!class.retryable);
        assert_eq!(class.fault, FaultClass::Contract);
        assert_eq!(class.fault.to_string(), "contract");
    }

    #[test]
    fn test_manifest_error_is_parse_fault() {
        let err = FixcheckError::Manifest("expected object".into());
        assert_eq!(err.classify().fault, FaultClass::Parse);
    }

    #[test]
    fn test_io_error_is_io_fault() {
        let err = FixcheckError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.classify().fault, FaultClass::Io);
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = FixcheckError::Config("invalid config".into());
        assert!(!err.classify().retryable);
    }
}
