use std::collections::BTreeMap;
use std::path::Path;
use crate::config::SandboxConfig;
use crate::utils::format_list;
use super::walk_files;

const MARKER_FILES: &[&str] = &[
    "README.md",
    "requirements.txt",
    "package.json",
    "Dockerfile",
    "docker-compose.yml",
];

const CODE_EXTENSIONS: &[&str] = &["py", "js", "ts", "java", "go", "rs", "cpp", "c"];

/// Marker files present at the top level plus a per-extension census of source files.
pub fn analyze_structure(sandbox: &Path, config: &SandboxConfig) -> String {
    let found: Vec<&str> = MARKER_FILES
        .iter()
        .copied()
        .filter(|name| sandbox.join(name).is_file())
        .collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for file in walk_files(sandbox, config) {
        let ext = file.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if let Some(known) = CODE_EXTENSIONS.iter().find(|k| **k == ext) {
            *counts.entry(*known).or_default() += 1;
        }
    }

    let census = counts
        .iter()
        .map(|(ext, n)| format!(".{}: {}", ext, n))
        .collect::<Vec<_>>()
        .join(", ");

    format!("Config files: {}; Code files: {{{}}}", format_list(found), census)
}
