//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A topology file alone in its own temp directory, removed on drop.
pub struct TempConfig {
    _dir: TempDir,
    path: PathBuf,
}

impl TempConfig {
    pub fn new(name: &str, contents: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{}.conf", name));
        std::fs::write(&path, contents).unwrap();
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rewrite(&self, contents: &str) {
        std::fs::write(&self.path, contents).unwrap();
    }
}

/// Poll `check` until it returns true or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
