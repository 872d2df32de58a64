//! Filesystem access used by the pipeline.
//!
//! The host owns the filesystem; the pipeline only reads source files and
//! probes for existence. [`NativeFs`] goes to disk through tokio,
//! [`MemoryFs`] serves an in-memory file map (playgrounds, tests).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;

/// Read access to source files.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file as UTF-8.
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Whether a regular file exists at `path`.
    fn is_file(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFs;

#[async_trait]
impl FileSystem for NativeFs {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory file map keyed by absolute path.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: DashMap<PathBuf, String>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    /// Remove a file.
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.files.remove(path).map(|(_, content)| content)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(path)
            .map(|content| content.value().clone())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )
            })
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}
