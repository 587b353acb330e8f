use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FixcheckConfig {
    pub sandbox: SandboxConfig,
    pub limits: LimitsConfig,
    pub tools: ToolsConfig,
    pub publish: PublishConfig,
    pub verdict: VerdictConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Parent directory for sandboxes; the system temp dir when unset.
    pub root: Option<PathBuf>,
    pub prefix: String,
    /// Leave the sandbox on disk after the run for manual inspection.
    pub keep: bool,
    /// Directory names skipped by every tree walk of the prober.
    pub excluded_dirs: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: None,
            prefix: "security_fix_sandbox_".to_string(),
            keep: false,
            excluded_dirs: [".git", "node_modules", "__pycache__", ".venv", "venv", ".fixcheck-site"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SandboxConfig {
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub install_timeout_secs: u64,
    pub syntax_timeout_secs: u64,
    pub startup_timeout_secs: u64,
    pub scan_timeout_secs: u64,
    pub install_error_chars: usize,
    pub syntax_error_chars: usize,
    pub startup_error_chars: usize,
    pub max_syntax_samples: usize,
    pub max_endpoint_samples: usize,
    pub max_python_entry_points: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            install_timeout_secs: 300,
            syntax_timeout_secs: 30,
            startup_timeout_secs: 10,
            scan_timeout_secs: 300,
            install_error_chars: 500,
            syntax_error_chars: 100,
            startup_error_chars: 50,
            max_syntax_samples: 3,
            max_endpoint_samples: 5,
            max_python_entry_points: 3,
        }
    }
}

impl LimitsConfig {
    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }

    pub fn syntax_timeout(&self) -> Duration {
        Duration::from_secs(self.syntax_timeout_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub python: String,
    pub node: String,
    pub npm: String,
    /// Scanner program followed by its arguments; the sandbox path is appended.
    pub scanner: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            node: "node".to_string(),
            npm: "npm".to_string(),
            scanner: vec!["trivy".to_string(), "fs".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Local,
    Http,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Http => "http",
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublishConfig {
    pub agent_type: String,
    pub backend: StorageBackend,
    /// Root directory for the local backend.
    pub directory: PathBuf,
    /// Base URL for the http backend.
    pub endpoint: Option<String>,
    pub bucket: String,
    /// Name of the environment variable holding a bearer token.
    pub token_env: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            agent_type: "code_interpreter".to_string(),
            backend: StorageBackend::Local,
            directory: PathBuf::from("./results"),
            endpoint: None,
            bucket: "security-agent-results".to_string(),
            token_env: None,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerdictConfig {
    /// Derive the upstream recommendation from report text when none is given explicitly.
    pub legacy_token_match: bool,
}

impl Default for VerdictConfig {
    fn default() -> Self {
        Self { legacy_token_match: true }
    }
}
