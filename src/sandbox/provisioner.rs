use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use crate::config::SandboxConfig;
use crate::errors::FixcheckError;
use crate::models::StageReport;

/// Create the run's top-level sandbox directory.
///
/// Uses `explicit` when given, otherwise `{root}/{prefix}{uuid}`. This is the one step
/// whose failure ends the run with an ERROR verdict.
pub async fn allocate(config: &SandboxConfig, explicit: Option<&Path>) -> Result<PathBuf, FixcheckError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config.root_dir().join(format!("{}{}", config.prefix, uuid::Uuid::new_v4())),
    };

    tokio::fs::create_dir_all(&path).await.map_err(|e| {
        FixcheckError::Sandbox(format!("Cannot create sandbox directory {}: {}", path.display(), e))
    })?;

    debug!(sandbox = %path.display(), "Sandbox allocated");
    Ok(path)
}

/// Replace `target` with a full copy of `source`.
///
/// Whatever was at `target` is removed first, so the result is never a merge of old and
/// new contents. Failures come back as evidence text.
pub async fn provision(source: &Path, target: &Path) -> StageReport {
    let source = source.to_path_buf();
    let target = target.to_path_buf();

    let copy = {
        let (source, target) = (source.clone(), target.clone());
        tokio::task::spawn_blocking(move || replace_tree(&source, &target))
    };

    match copy.await {
        Ok(Ok(files)) => {
            info!(files, sandbox = %target.display(), "Repository copied to sandbox");
            StageReport::succeeded(format!("Repository copied to sandbox: {}", target.display()))
        }
        Ok(Err(e)) => {
            warn!(error = %e, source = %source.display(), "Sandbox setup failed");
            StageReport::failed(format!("Error setting up sandbox: {}", e))
        }
        Err(e) => StageReport::failed(format!("Error setting up sandbox: copy task aborted: {}", e)),
    }
}

/// Remove the sandbox. Best effort; returns whether the directory is gone.
pub async fn cleanup(path: &Path) -> bool {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {
            debug!(sandbox = %path.display(), "Sandbox removed");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(sandbox = %path.display(), error = %e, "Failed to remove sandbox");
            false
        }
    }
}

fn replace_tree(source: &Path, target: &Path) -> Result<usize, FixcheckError> {
    if !source.is_dir() {
        return Err(FixcheckError::Sandbox(format!(
            "Source repository is not a readable directory: {}",
            source.display()
        )));
    }
    if source == target {
        return Err(FixcheckError::Sandbox("Sandbox path is the source repository".to_string()));
    }

    match target.symlink_metadata() {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(target)?,
        Ok(_) => std::fs::remove_file(target)?,
        Err(_) => {}
    }
    std::fs::create_dir_all(target)?;

    // A sandbox nested inside the source must not be copied into itself.
    let target_abs = std::fs::canonicalize(target)?;

    let mut files = 0usize;
    let walker = WalkDir::new(source)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| std::fs::canonicalize(e.path()).map_or(true, |p| p != target_abs));

    for entry in walker {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(source) {
            Ok(r) if r.as_os_str().is_empty() => continue,
            Ok(r) => r,
            Err(_) => continue,
        };
        let dest = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &dest)?;
            files += 1;
        } else {
            std::fs::copy(entry.path(), &dest)?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(unix)]
fn copy_link(link: &Path, dest: &Path) -> Result<(), FixcheckError> {
    let pointee = std::fs::read_link(link)?;
    std::os::unix::fs::symlink(pointee, dest)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_link(link: &Path, dest: &Path) -> Result<(), FixcheckError> {
    if link.is_file() {
        std::fs::copy(link, dest)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StageOutcome;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_provision_copies_tree() {
        let source = tempfile::tempdir().unwrap();
        let sandbox = tempfile::tempdir().unwrap();
        write(&source.path().join("app.py"), "print('hi')\n");
        write(&source.path().join("pkg/util.py"), "X = 1\n");

        let target = sandbox.path().join("sb");
        let report = provision(source.path(), &target).await;

        assert_eq!(report.outcome, StageOutcome::Succeeded);
        assert_eq!(std::fs::read_to_string(target.join("app.py")).unwrap(), "print('hi')\n");
        assert_eq!(std::fs::read_to_string(target.join("pkg/util.py")).unwrap(), "X = 1\n");
    }

    #[tokio::test]
    async fn test_reprovision_is_not_a_merge() {
        let source = tempfile::tempdir().unwrap();
        let sandbox = tempfile::tempdir().unwrap();
        let target = sandbox.path().join("sb");
        write(&source.path().join("keep.txt"), "v1");
        write(&source.path().join("gone.txt"), "old");

        provision(source.path(), &target).await;
        write(&target.join("scratch.txt"), "left over from a previous run");
        std::fs::remove_file(source.path().join("gone.txt")).unwrap();
        write(&source.path().join("keep.txt"), "v2");

        let report = provision(source.path(), &target).await;
        assert_eq!(report.outcome, StageOutcome::Succeeded);

        let mut names: Vec<String> = std::fs::read_dir(&target)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["keep.txt"]);
        assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_missing_source_is_evidence() {
        let sandbox = tempfile::tempdir().unwrap();
        let report = provision(Path::new("/nonexistent/fixcheck/repo"), &sandbox.path().join("sb")).await;
        assert_eq!(report.outcome, StageOutcome::Failed);
        assert!(report.detail.starts_with("Error setting up sandbox:"));
    }

    #[tokio::test]
    async fn test_nested_target_is_not_copied_into_itself() {
        let source = tempfile::tempdir().unwrap();
        write(&source.path().join("index.js"), "console.log(1)\n");
        let target = source.path().join(".sandboxes/run");

        let report = provision(source.path(), &target).await;
        assert_eq!(report.outcome, StageOutcome::Succeeded);
        assert!(target.join("index.js").exists());
        assert!(!target.join(".sandboxes/run").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_recreated() {
        let source = tempfile::tempdir().unwrap();
        let sandbox = tempfile::tempdir().unwrap();
        write(&source.path().join("real.txt"), "data");
        std::os::unix::fs::symlink("real.txt", source.path().join("link.txt")).unwrap();

        let target = sandbox.path().join("sb");
        provision(source.path(), &target).await;
        let meta = std::fs::symlink_metadata(target.join("link.txt")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(std::fs::read_link(target.join("link.txt")).unwrap(), PathBuf::from("real.txt"));
    }

    #[tokio::test]
    async fn test_allocate_unique_paths_and_cleanup() {
        let root = tempfile::tempdir().unwrap();
        let config = SandboxConfig { root: Some(root.path().to_path_buf()), ..Default::default() };

        let a = allocate(&config, None).await.unwrap();
        let b = allocate(&config, None).await.unwrap();
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("security_fix_sandbox_"));
        assert!(a.is_dir());

        assert!(cleanup(&a).await);
        assert!(!a.exists());
        assert!(cleanup(&a).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_allocate_under_a_file_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let config = SandboxConfig { root: Some(blocker), ..Default::default() };

        let err = allocate(&config, None).await.unwrap_err();
        assert!(matches!(err, FixcheckError::Sandbox(_)));
    }
}
