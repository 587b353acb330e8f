use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use crate::errors::FixcheckError;
use crate::models::StageReport;
use crate::utils::stays_inside;

pub const MANIFEST_FILE: &str = "package.json";

fn default_section() -> String {
    "dependencies".to_string()
}

/// One proposed change to the sandboxed repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixDescriptor {
    /// Overwrite (or create) a file with the given text.
    FileReplacement { path: PathBuf, content: String },
    /// Set a dependency version inside a section of `package.json`.
    ManifestBump {
        package: String,
        version: String,
        #[serde(default = "default_section")]
        section: String,
    },
}

impl FixDescriptor {
    pub fn bump(package: impl Into<String>, version: impl Into<String>) -> Self {
        FixDescriptor::ManifestBump {
            package: package.into(),
            version: version.into(),
            section: default_section(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::FileReplacement { path, .. } => format!("replace {}", path.display()),
            Self::ManifestBump { package, version, .. } => format!("bump {}@{}", package, version),
        }
    }
}

/// Parse a `name@version` CLI argument. Scoped names (`@scope/pkg@1.0.0`) are supported.
pub fn parse_bump(arg: &str, section: &str) -> Result<FixDescriptor, FixcheckError> {
    match arg.rsplit_once('@') {
        Some((name, version)) if !name.is_empty() && !version.is_empty() => {
            Ok(FixDescriptor::ManifestBump {
                package: name.to_string(),
                version: version.to_string(),
                section: section.to_string(),
            })
        }
        _ => Err(FixcheckError::InvalidInput(format!(
            "Expected <package>@<version>, got '{}'",
            arg
        ))),
    }
}

/// Load a list of fix descriptors from a JSON or YAML file (by extension).
pub async fn load_fixes(path: &Path) -> Result<Vec<FixDescriptor>, FixcheckError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        FixcheckError::InvalidInput(format!("Cannot read fixes file {}: {}", path.display(), e))
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let fixes: Vec<FixDescriptor> = if is_yaml {
        serde_yaml::from_str(&content)
            .map_err(|e| FixcheckError::InvalidInput(format!("Invalid fixes file: {}", e)))?
    } else {
        serde_json::from_str(&content)
            .map_err(|e| FixcheckError::InvalidInput(format!("Invalid fixes file: {}", e)))?
    };
    Ok(fixes)
}

/// Resolve a fix target inside the sandbox, refusing anything that could escape it.
fn sandbox_target(sandbox: &Path, relative: &Path) -> Result<PathBuf, FixcheckError> {
    if relative.as_os_str().is_empty() {
        return Err(FixcheckError::InvalidInput("Fix target path is empty".to_string()));
    }
    if !stays_inside(relative) {
        return Err(FixcheckError::InvalidInput(format!(
            "Fix target must be a relative path inside the sandbox: {}",
            relative.display()
        )));
    }
    Ok(sandbox.join(relative))
}

/// Overwrite `relative` inside the sandbox with `content`. Last writer wins.
pub async fn apply_raw_fix(sandbox: &Path, relative: &Path, content: &str) -> Result<String, FixcheckError> {
    let target = sandbox_target(sandbox, relative)?;
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&target, content).await?;
    info!(path = %relative.display(), bytes = content.len(), "File replacement applied");
    Ok(format!("Applied fix to {}", relative.display()))
}

/// Bump `package` to `version` in `section` of the sandbox's `package.json`.
///
/// The manifest is only rewritten when the package is present; otherwise it is left
/// byte-for-byte as it was.
pub async fn apply_manifest_bump(
    sandbox: &Path,
    package: &str,
    version: &str,
    section: &str,
) -> Result<String, FixcheckError> {
    let manifest_path = sandbox.join(MANIFEST_FILE);
    let original = tokio::fs::read_to_string(&manifest_path).await.map_err(|e| {
        FixcheckError::Manifest(format!("Cannot read {}: {}", MANIFEST_FILE, e))
    })?;

    let (updated, old) = bump_manifest_text(&original, package, version, section)?;
    tokio::fs::write(&manifest_path, updated).await?;

    info!(package, from = %old, to = version, section, "Manifest bumped");
    Ok(format!("Updated {} from {} to {} in {}", package, old, version, section))
}

/// Pure rewrite of manifest text. Returns the new text and the previous version.
pub(crate) fn bump_manifest_text(
    original: &str,
    package: &str,
    version: &str,
    section: &str,
) -> Result<(String, String), FixcheckError> {
    let mut manifest: serde_json::Value = serde_json::from_str(original)
        .map_err(|e| FixcheckError::Manifest(format!("Malformed {}: {}", MANIFEST_FILE, e)))?;

    let deps = manifest
        .get_mut(section)
        .and_then(|s| s.as_object_mut())
        .ok_or_else(|| FixcheckError::MissingDependency(format!(
            "Package {} not found in {} ({} has no {} section)",
            package, section, MANIFEST_FILE, section
        )))?;

    let entry = deps.get_mut(package).ok_or_else(|| {
        FixcheckError::MissingDependency(format!("Package {} not found in {}", package, section))
    })?;

    let old = match &*entry {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    *entry = serde_json::Value::String(version.to_string());

    let mut updated = serde_json::to_string_pretty(&manifest)?;
    if original.ends_with('\n') {
        updated.push('\n');
    }
    Ok((updated, old))
}

/// Apply every fix in order and fold the results into one evidence entry.
pub async fn apply_fixes(sandbox: &Path, fixes: &[FixDescriptor]) -> StageReport {
    if fixes.is_empty() {
        return StageReport::skipped("No fixes to apply");
    }

    let mut lines = Vec::with_capacity(fixes.len());
    let mut failures = 0usize;

    for fix in fixes {
        let result = match fix {
            FixDescriptor::FileReplacement { path, content } => {
                apply_raw_fix(sandbox, path, content).await
            }
            FixDescriptor::ManifestBump { package, version, section } => {
                apply_manifest_bump(sandbox, package, version, section).await
            }
        };
        match result {
            Ok(message) => lines.push(message),
            Err(e) => {
                warn!(fix = %fix.describe(), fault = %e.classify().fault, error = %e, "Fix could not be applied");
                failures += 1;
                lines.push(format!("Failed to {}: {}", fix.describe(), e));
            }
        }
    }

    let detail = lines.join("; ");
    if failures == 0 {
        StageReport::succeeded(detail)
    } else {
        StageReport::failed(detail)
    }
}
