use std::path::Path;
use crate::errors::FixcheckError;
use super::types::{FixcheckConfig, StorageBackend};
use super::security::validate_security_patterns;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

pub async fn parse_config(path: &Path) -> Result<FixcheckConfig, FixcheckError> {
    if !path.exists() {
        return Err(FixcheckError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(FixcheckError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse configuration text. An empty document yields the defaults.
pub fn parse_config_str(content: &str) -> Result<FixcheckConfig, FixcheckError> {
    if content.trim().is_empty() {
        return Ok(FixcheckConfig::default());
    }

    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;

    validate_security_patterns(&yaml)?;
    validate_schema(&yaml)?;

    let config: FixcheckConfig = serde_yaml::from_value(yaml)?;
    validate_conflicts(&config)?;

    debug!(backend = %config.publish.backend, "Configuration loaded");
    Ok(config)
}

/// Load the configuration file when one is given, the defaults otherwise.
pub async fn load_or_default(path: Option<&Path>) -> Result<FixcheckConfig, FixcheckError> {
    match path {
        Some(p) => parse_config(p).await,
        None => Ok(FixcheckConfig::default()),
    }
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), FixcheckError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| FixcheckError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| FixcheckError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        if !messages.is_empty() {
            return Err(FixcheckError::Config(format!(
                "Invalid configuration: {}",
                messages.join("; ")
            )));
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &FixcheckConfig) -> Result<(), FixcheckError> {
    if config.publish.backend == StorageBackend::Http && config.publish.endpoint.is_none() {
        return Err(FixcheckError::Config(
            "publish.backend is 'http' but publish.endpoint is not set".into(),
        ));
    }

    if config.tools.scanner.is_empty() {
        return Err(FixcheckError::Config("tools.scanner must name a program".into()));
    }

    if let Some(var) = &config.publish.token_env {
        if std::env::var(var).is_err() {
            warn!(variable = %var, "Publish token variable is not set; uploads will be anonymous");
        }
    }

    if config.limits.max_endpoint_samples == 0 || config.limits.max_syntax_samples == 0 {
        warn!("Sample caps of 0 hide all detail from the evidence transcript");
    }

    Ok(())
}
