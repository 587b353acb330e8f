use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::config::LimitsConfig;
use crate::utils::stays_inside;

/// Closed set of application kinds the prober knows how to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    PythonGeneric,
    Flask,
    FastApi,
    Django,
    Node,
    Unknown,
}

impl AppKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PythonGeneric => "python",
            Self::Flask => "flask",
            Self::FastApi => "fastapi",
            Self::Django => "django",
            Self::Node => "node",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_python(&self) -> bool {
        matches!(self, Self::PythonGeneric | Self::Flask | Self::FastApi | Self::Django)
    }

    /// Kinds that get endpoint discovery.
    pub fn is_web(&self) -> bool {
        matches!(self, Self::Flask | Self::FastApi | Self::Django | Self::Node)
    }
}

impl std::fmt::Display for AppKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EntryPoint {
    /// Sandbox-relative source file.
    File(PathBuf),
    /// A command that is reported on but never executed, e.g. `npm start`.
    Command(String),
}

impl std::fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Command(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppProfile {
    pub kind: AppKind,
    pub entry_points: Vec<EntryPoint>,
}

impl AppProfile {
    fn new(kind: AppKind, entry_points: Vec<EntryPoint>) -> Self {
        Self { kind, entry_points }
    }
}

fn files(names: &[&str]) -> Vec<EntryPoint> {
    names.iter().map(|n| EntryPoint::File(PathBuf::from(n))).collect()
}

/// Classify the sandbox from its marker files. Total: always returns a profile.
///
/// Rules are checked in order: `app.py` (framework picked by case-sensitive text match),
/// then `package.json`, then any top-level `.py` file.
pub fn detect_app(sandbox: &Path, limits: &LimitsConfig) -> AppProfile {
    let app_py = sandbox.join("app.py");
    let profile = if app_py.is_file() {
        let text = std::fs::read(&app_py)
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default();
        if text.contains("Flask") {
            AppProfile::new(AppKind::Flask, files(&["app.py"]))
        } else if text.contains("FastAPI") {
            AppProfile::new(AppKind::FastApi, files(&["app.py"]))
        } else if text.contains("Django") {
            AppProfile::new(AppKind::Django, files(&["manage.py"]))
        } else {
            AppProfile::new(AppKind::PythonGeneric, files(&["app.py"]))
        }
    } else if sandbox.join("package.json").is_file() {
        AppProfile::new(AppKind::Node, node_entry_points(&sandbox.join("package.json")))
    } else {
        let mut top_level: Vec<String> = std::fs::read_dir(sandbox)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .filter(|name| name.ends_with(".py"))
                    .collect()
            })
            .unwrap_or_default();

        if top_level.is_empty() {
            AppProfile::new(AppKind::Unknown, Vec::new())
        } else {
            top_level.sort();
            let entry_points = top_level
                .into_iter()
                .take(limits.max_python_entry_points)
                .map(|name| EntryPoint::File(PathBuf::from(name)))
                .collect();
            AppProfile::new(AppKind::PythonGeneric, entry_points)
        }
    };

    debug!(kind = %profile.kind, entry_points = profile.entry_points.len(), "Application detected");
    profile
}

fn node_entry_points(manifest: &Path) -> Vec<EntryPoint> {
    let parsed = std::fs::read_to_string(manifest)
        .ok()
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).ok());

    let Some(manifest) = parsed else {
        return files(&["index.js", "server.js", "app.js"]);
    };

    let main = manifest.get("main").and_then(|m| m.as_str()).map(PathBuf::from);
    if let Some(path) = main.as_ref().filter(|p| !stays_inside(p)) {
        warn!(main = %path.display(), "Ignoring package.json main outside the sandbox");
    }

    if let Some(main) = main.filter(|p| stays_inside(p)) {
        vec![EntryPoint::File(main)]
    } else if manifest.pointer("/scripts/start").is_some() {
        vec![EntryPoint::Command("npm start".to_string())]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(files: &[(&str, &str)]) -> AppProfile {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        detect_app(dir.path(), &LimitsConfig::default())
    }

    #[test]
    fn test_python_frameworks() {
        let flask = detect(&[("app.py", "from flask import Flask\napp = Flask(__name__)\n")]);
        assert_eq!(flask.kind, AppKind::Flask);
        assert_eq!(flask.entry_points, vec![EntryPoint::File("app.py".into())]);

        assert_eq!(detect(&[("app.py", "from fastapi import FastAPI\n")]).kind, AppKind::FastApi);

        let django = detect(&[("app.py", "# Django settings shim\n")]);
        assert_eq!(django.kind, AppKind::Django);
        assert_eq!(django.entry_points, vec![EntryPoint::File("manage.py".into())]);

        assert_eq!(detect(&[("app.py", "print('flask')\n")]).kind, AppKind::PythonGeneric);
    }

    #[test]
    fn test_app_py_beats_package_json() {
        let profile = detect(&[("app.py", "import os\n"), ("package.json", "{\"main\": \"index.js\"}")]);
        assert_eq!(profile.kind, AppKind::PythonGeneric);
    }

    #[test]
    fn test_node_entry_points() {
        let main = detect(&[("package.json", "{\"main\": \"server.js\", \"scripts\": {\"start\": \"node x\"}}")]);
        assert_eq!(main.kind, AppKind::Node);
        assert_eq!(main.entry_points, vec![EntryPoint::File("server.js".into())]);

        let start = detect(&[("package.json", "{\"scripts\": {\"start\": \"node index.js\"}}")]);
        assert_eq!(start.entry_points, vec![EntryPoint::Command("npm start".into())]);

        let escaping = detect(&[("package.json", "{\"main\": \"../x.js\", \"scripts\": {\"start\": \"node x\"}}")]);
        assert_eq!(escaping.entry_points, vec![EntryPoint::Command("npm start".into())]);

        let absolute = detect(&[("package.json", "{\"main\": \"/abs/x.js\"}")]);
        assert!(absolute.entry_points.is_empty());

        let bare = detect(&[("package.json", "{\"name\": \"x\"}")]);
        assert!(bare.entry_points.is_empty());

        let broken = detect(&[("package.json", "{ nope")]);
        assert_eq!(broken.kind, AppKind::Node);
        assert_eq!(broken.entry_points.len(), 3);
    }

    #[test]
    fn test_loose_python_files_sorted_and_capped() {
        let profile = detect(&[("d.py", ""), ("b.py", ""), ("a.py", ""), ("c.py", ""), ("notes.txt", "")]);
        assert_eq!(profile.kind, AppKind::PythonGeneric);
        let names: Vec<String> = profile.entry_points.iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["a.py", "b.py", "c.py"]);
    }

    #[test]
    fn test_unknown() {
        let profile = detect(&[("main.go", "package main")]);
        assert_eq!(profile.kind, AppKind::Unknown);
        assert!(profile.entry_points.is_empty());
    }

    #[test]
    fn test_detection_is_deterministic() {
        let files = [("package.json", "{\"main\": \"index.js\"}"), ("z.py", "")];
        assert_eq!(detect(&files), detect(&files));
    }
}
