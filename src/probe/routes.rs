//! Endpoint discovery by pattern matching over source text.
//!
//! This is a heuristic, not a parser: routes built dynamically are missed and
//! commented-out decorators are counted.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;
use crate::config::FixcheckConfig;
use crate::utils::format_list;
use super::detect::AppKind;
use super::walk_files;

static FLASK_ROUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@\w+\.route\(\s*["']([^"']*)["']"#).unwrap());
static FASTAPI_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@\w+\.(get|post|put|delete|patch)\(\s*["']([^"']*)["']"#).unwrap()
});
static DJANGO_ROUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(?:re_)?path\(\s*r?["']([^"']*)["']"#).unwrap());
static EXPRESS_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:app|router)\.(get|post|put|delete|patch)\(\s*["'`]([^"'`]*)["'`]"#).unwrap()
});

/// Routes declared in Python source.
pub fn python_routes(content: &str, is_urls_module: bool) -> Vec<String> {
    let mut found: Vec<String> = FLASK_ROUTE
        .captures_iter(content)
        .map(|c| format!("Flask: {}", &c[1]))
        .collect();
    found.extend(
        FASTAPI_ROUTE
            .captures_iter(content)
            .map(|c| format!("FastAPI: {} ({})", &c[2], &c[1])),
    );
    if is_urls_module {
        found.extend(
            DJANGO_ROUTE
                .captures_iter(content)
                .map(|c| format!("Django: {}", &c[1])),
        );
    }
    found
}

/// Express-style routes declared in JavaScript source.
pub fn express_routes(content: &str) -> Vec<String> {
    EXPRESS_ROUTE
        .captures_iter(content)
        .map(|c| format!("Express: {} ({})", &c[2], &c[1]))
        .collect()
}

pub fn discover_endpoints(sandbox: &Path, config: &FixcheckConfig, kind: AppKind) -> String {
    if !kind.is_web() {
        return format!("Endpoint discovery skipped for {} app", kind);
    }

    let mut endpoints = Vec::new();
    for file in walk_files(sandbox, &config.sandbox) {
        let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if ext != "py" && ext != "js" {
            continue;
        }
        let content = match std::fs::read(sandbox.join(&file)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                debug!(file = %file.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };
        if ext == "py" {
            let is_urls = file.file_name().map_or(false, |n| n == "urls.py");
            endpoints.extend(python_routes(&content, is_urls));
        } else {
            endpoints.extend(express_routes(&content));
        }
    }

    if endpoints.is_empty() {
        "No API endpoints detected".to_string()
    } else {
        let samples = endpoints.iter().take(config.limits.max_endpoint_samples);
        format!("Found {} endpoints: {}", endpoints.len(), format_list(samples))
    }
}
