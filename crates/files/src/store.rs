//! Text stores - where documents are read from and written to
//!
//! `FsStore` for real files, `MemoryStore` for tests and embedding.

use async_trait::async_trait;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{FileError, Result};

/// Source and sink of UTF-8 documents
#[async_trait]
pub trait TextStore: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Read the whole document at `path`
    async fn load_text(&self, path: &Path) -> Result<String>;

    /// Create or truncate `path` and write `text`
    async fn store_text(&self, path: &Path, text: &str) -> Result<()>;
}

/// Store backed by the local file system
#[derive(Debug, Clone, Default)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextStore for FsStore {
    fn name(&self) -> &str {
        "fs"
    }

    async fn load_text(&self, path: &Path) -> Result<String> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| FileError::io(path, e))?;
        tracing::debug!("Loaded {} bytes from {}", text.len(), path.display());
        Ok(text)
    }

    async fn store_text(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FileError::io(parent, e))?;
        }
        tokio::fs::write(path, text)
            .await
            .map_err(|e| FileError::io(path, e))?;
        tracing::debug!("Stored {} bytes to {}", text.len(), path.display());
        Ok(())
    }
}

/// In-memory store keyed by path
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: DashMap<PathBuf, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.get(path.as_ref()).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl TextStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_text(&self, path: &Path) -> Result<String> {
        self.get(path).ok_or_else(|| {
            FileError::io(
                path,
                io::Error::new(io::ErrorKind::NotFound, "not in memory store"),
            )
        })
    }

    async fn store_text(&self, path: &Path, text: &str) -> Result<()> {
        self.insert(path, text);
        Ok(())
    }
}
