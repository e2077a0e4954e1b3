//! Ephemeral workspace management.
//!
//! Each candidate owns an isolated copy of the base workspace for the
//! duration of one search call, so concurrent candidates never observe each
//! other's writes. Workspaces live under `.summit/workspaces/` inside the
//! base and are deleted on every exit path.

use crate::domain::errors::{DomainError, DomainResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory under the base workspace that holds ephemeral copies.
/// Excluded from workspace copies so nested runs don't recurse.
pub const EPHEMERAL_ROOT: &str = ".summit";

/// Scoped owner of ephemeral workspace directories.
///
/// Acquire directories through [`WorkspaceGuard::create_workspace`], then
/// call [`WorkspaceGuard::release`] once results are consumed. `Drop` is a
/// synchronous best-effort backstop for early returns and panics, so the
/// cleanup invariant holds on every exit path.
#[derive(Debug, Default)]
pub struct WorkspaceGuard {
    created: Vec<PathBuf>,
}

impl WorkspaceGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths currently owned by this guard.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.created
    }

    /// Create one ephemeral workspace as a copy of `base`.
    ///
    /// # Errors
    ///
    /// Returns a workspace error if the copy fails; anything created before
    /// the failure remains owned by the guard and is still cleaned up.
    pub async fn create_workspace(
        &mut self,
        base: &Path,
        run_id: Uuid,
        index: usize,
    ) -> DomainResult<PathBuf> {
        let short_run = &run_id.to_string()[..8];
        let dest = base
            .join(EPHEMERAL_ROOT)
            .join("workspaces")
            .join(format!("{short_run}-{index}"));

        tokio::fs::create_dir_all(&dest).await?;
        self.created.push(dest.clone());

        copy_dir_recursive(base, &dest).await.map_err(|e| {
            DomainError::Workspace(format!(
                "Failed to copy workspace to {}: {e}",
                dest.display()
            ))
        })?;

        debug!(workspace = %dest.display(), "Created ephemeral workspace");
        Ok(dest)
    }

    /// Delete every owned directory. Idempotent.
    pub async fn release(&mut self) {
        for path in self.created.drain(..) {
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => debug!(workspace = %path.display(), "Removed ephemeral workspace"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(workspace = %path.display(), error = %e, "Failed to remove ephemeral workspace");
                }
            }
        }
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        for path in self.created.drain(..) {
            let _ = std::fs::remove_dir_all(&path);
        }
    }
}

/// Recursively copy `src` into `dest`, skipping the ephemeral root.
async fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    // Queue-based walk; tokio::fs has no recursive copy.
    let mut pending = vec![(src.to_path_buf(), dest.to_path_buf())];

    while let Some((from, to)) = pending.pop() {
        tokio::fs::create_dir_all(&to).await?;
        let mut entries = tokio::fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name == EPHEMERAL_ROOT {
                continue;
            }
            let from_path = entry.path();
            let to_path = to.join(&name);
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push((from_path, to_path));
            } else if file_type.is_file() {
                tokio::fs::copy(&from_path, &to_path).await?;
            }
            // Symlinks are skipped; candidate workspaces hold plain files.
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn workspace_copy_includes_base_files() {
        let base = TempDir::new().unwrap();
        tokio::fs::write(base.path().join("data.txt"), "payload")
            .await
            .unwrap();
        tokio::fs::create_dir(base.path().join("tests")).await.unwrap();
        tokio::fs::write(base.path().join("tests/test_a.py"), "assert True")
            .await
            .unwrap();

        let mut guard = WorkspaceGuard::new();
        let ws = guard
            .create_workspace(base.path(), Uuid::new_v4(), 0)
            .await
            .unwrap();

        assert_eq!(
            tokio::fs::read_to_string(ws.join("data.txt")).await.unwrap(),
            "payload"
        );
        assert!(ws.join("tests/test_a.py").exists());

        guard.release().await;
        assert!(!ws.exists());
    }

    #[tokio::test]
    async fn copy_skips_ephemeral_root() {
        let base = TempDir::new().unwrap();
        tokio::fs::write(base.path().join("data.txt"), "payload")
            .await
            .unwrap();

        let run = Uuid::new_v4();
        let mut guard = WorkspaceGuard::new();
        let first = guard.create_workspace(base.path(), run, 0).await.unwrap();
        let second = guard.create_workspace(base.path(), run, 1).await.unwrap();

        // The second copy must not contain the first one.
        assert!(!second.join(EPHEMERAL_ROOT).exists());
        assert!(first.join("data.txt").exists());

        guard.release().await;
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn drop_removes_leftover_workspaces() {
        let base = TempDir::new().unwrap();
        tokio::fs::write(base.path().join("data.txt"), "payload")
            .await
            .unwrap();

        let ws = {
            let mut guard = WorkspaceGuard::new();
            guard
                .create_workspace(base.path(), Uuid::new_v4(), 0)
                .await
                .unwrap()
        };

        assert!(!ws.exists());
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let base = TempDir::new().unwrap();
        let mut guard = WorkspaceGuard::new();
        let ws = guard
            .create_workspace(base.path(), Uuid::new_v4(), 0)
            .await
            .unwrap();

        guard.release().await;
        guard.release().await;
        assert!(!ws.exists());
    }
}
