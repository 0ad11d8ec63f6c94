// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request-scoped temporary storage
//!
//! A session owns one private directory under the work root and every file
//! written into it. Release happens exactly once: explicitly through
//! `release()`, or from `Drop` if the request future is abandoned.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Prefix of every request directory
pub const SESSION_PREFIX: &str = "signboard-";

pub struct RequestSession {
    dir: Option<TempDir>,
    root: PathBuf,
    stamp: i64,
    artifacts: Vec<PathBuf>,
}

impl std::fmt::Debug for RequestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSession")
            .field("root", &self.root)
            .field("stamp", &self.stamp)
            .field("artifacts", &self.artifacts.len())
            .finish()
    }
}

impl RequestSession {
    /// Create a uniquely named directory under `work_root`
    pub fn create(work_root: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(work_root)?;
        let dir = tempfile::Builder::new()
            .prefix(SESSION_PREFIX)
            .tempdir_in(work_root)?;
        let root = dir.path().to_path_buf();
        debug!("Created request session at {}", root.display());

        Ok(Self {
            dir: Some(dir),
            root,
            stamp: chrono::Utc::now().timestamp_millis(),
            artifacts: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Millisecond timestamp shared by every file name in this session
    pub fn stamp(&self) -> i64 {
        self.stamp
    }

    pub fn original_path(&self, extension: &str) -> PathBuf {
        self.root
            .join(format!("Signboard_{}.{}", self.stamp, extension))
    }

    pub fn boxed_path(&self) -> PathBuf {
        self.root.join(format!("Signboard_boxed_{}.jpg", self.stamp))
    }

    pub fn crop_path(&self, index: usize) -> PathBuf {
        self.root
            .join(format!("Signboard_cropped_{}_{}.jpg", self.stamp, index))
    }

    /// Register a file for removal on release
    ///
    /// Paths are tracked before the file is written, so a half-written file
    /// is still removed.
    pub fn track(&mut self, path: PathBuf) {
        self.artifacts.push(path);
    }

    /// Remove every tracked file and the directory
    ///
    /// Failures are logged and swallowed.
    pub fn release(mut self) {
        self.cleanup();
    }

    fn cleanup(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        for artifact in self.artifacts.drain(..) {
            match std::fs::remove_file(&artifact) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("⚠️ Failed to remove {}: {}", artifact.display(), e),
            }
        }

        match dir.close() {
            Ok(()) => debug!("Released request session {}", self.root.display()),
            Err(e) => warn!(
                "⚠️ Failed to remove request session {}: {}",
                self.root.display(),
                e
            ),
        }
    }
}

impl Drop for RequestSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}
