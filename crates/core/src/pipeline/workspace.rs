//! Per-job artifact bookkeeping.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Tracks the intermediate files of one job and removes them.
///
/// [`cleanup`](Self::cleanup) is the normal path. Anything still tracked when
/// the workspace is dropped (panic, cancelled task) is removed synchronously.
#[derive(Debug)]
pub struct ArtifactWorkspace {
    dir: PathBuf,
    artifacts: Vec<PathBuf>,
}

impl ArtifactWorkspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            artifacts: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the artifact directory if needed.
    pub async fn prepare(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Reserves a path for an artifact and tracks it for removal.
    pub fn allocate(&mut self, file_name: &str) -> PathBuf {
        let path = self.dir.join(file_name);
        self.artifacts.push(path.clone());
        path
    }

    /// Paths currently tracked.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Removes every tracked artifact. Errors are logged, never returned.
    ///
    /// Returns the number of files actually deleted.
    pub async fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.artifacts.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    removed += 1;
                    debug!(path = %path.display(), "Removed artifact");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove artifact");
                }
            }
        }
        removed
    }
}

impl Drop for ArtifactWorkspace {
    fn drop(&mut self) {
        for path in &self.artifacts {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to remove artifact on drop");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cleanup_removes_existing_and_ignores_missing() {
        let temp = TempDir::new().unwrap();
        let mut workspace = ArtifactWorkspace::new(temp.path());

        let written = workspace.allocate("a.mp4");
        let _never_written = workspace.allocate("b.mp4");
        std::fs::write(&written, b"data").unwrap();

        assert_eq!(workspace.cleanup().await, 1);
        assert!(!written.exists());
        assert!(workspace.artifacts().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_creates_nested_dir() {
        let temp = TempDir::new().unwrap();
        let workspace = ArtifactWorkspace::new(temp.path().join("x").join("y"));
        workspace.prepare().await.unwrap();
        assert!(workspace.dir().is_dir());
    }

    #[test]
    fn test_drop_removes_tracked_files() {
        let temp = TempDir::new().unwrap();
        let path = {
            let mut workspace = ArtifactWorkspace::new(temp.path());
            let path = workspace.allocate("left.mp4");
            std::fs::write(&path, b"data").unwrap();
            path
        };
        assert!(!path.exists());
    }
}
