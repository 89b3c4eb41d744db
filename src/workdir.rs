use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use walkdir::WalkDir;

/// Creates a fresh directory `<root>/<prefix>_<timestamp>_<random>`.
///
/// Creation is atomic, so two concurrent runs can never share a directory.
/// The directory is left in place; removing it is the caller's decision.
pub fn allocate_dir(root: &Path, prefix: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(root)?;
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let dir = tempfile::Builder::new()
        .prefix(&format!("{prefix}_{stamp}_"))
        .rand_bytes(8)
        .tempdir_in(root)?;
    Ok(dir.keep())
}

/// Deletes top-level entries of `root` last modified before `older_than` ago.
/// Returns the removed paths.
pub async fn prune_work_dirs(root: &Path, older_than: Duration) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if fs::metadata(root).await.map(|m| !m.is_dir()).unwrap_or(true) {
        return Ok(removed);
    }

    let cutoff = SystemTime::now()
        .checked_sub(older_than)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
        let modified = entry
            .metadata()
            .ok()
            .and_then(|meta| meta.modified().ok())
            .unwrap_or(SystemTime::now());
        if modified > cutoff {
            continue;
        }

        let path = entry.path().to_path_buf();
        let result = if entry.file_type().is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        result.with_context(|| format!("Failed to remove {}", path.display()))?;
        removed.push(path);
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_dirs_are_unique_and_prefixed() {
        let root = tempfile::tempdir().unwrap();
        let a = allocate_dir(root.path(), "output").unwrap();
        let b = allocate_dir(root.path(), "output").unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
        let name = a.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("output_"), "{name}");
    }

    #[test]
    fn allocate_creates_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("temp").join("runs");
        let dir = allocate_dir(&nested, "run").unwrap();
        assert!(dir.starts_with(&nested));
    }

    #[tokio::test]
    async fn prune_removes_only_old_entries() {
        let root = tempfile::tempdir().unwrap();
        let dir = allocate_dir(root.path(), "run").unwrap();
        fs::write(dir.join("voiceover.mp3"), b"x").await.unwrap();

        let kept = prune_work_dirs(root.path(), Duration::from_secs(3600)).await.unwrap();
        assert!(kept.is_empty());
        assert!(dir.exists());

        let removed = prune_work_dirs(root.path(), Duration::ZERO).await.unwrap();
        assert_eq!(removed, vec![dir.clone()]);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn prune_missing_root_is_noop() {
        let root = tempfile::tempdir().unwrap();
        let removed = prune_work_dirs(&root.path().join("absent"), Duration::ZERO)
            .await
            .unwrap();
        assert!(removed.is_empty());
    }
}
