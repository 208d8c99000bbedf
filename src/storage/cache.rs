//! Append-only cache of processed post identifiers.
//!
//! The file holds one identifier per line. It is read once into memory at
//! startup and only ever appended to; every append is flushed and synced
//! before [`CacheStore::append`] returns.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::utils::url::cache_key;

/// Persistent set of processed identifiers.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    entries: HashSet<String>,
    /// Existing file does not end with a newline yet.
    needs_newline: bool,
}

impl CacheStore {
    /// Load the cache file, creating an empty one if it does not exist.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                ensure_parent(&path).await?;
                tokio::fs::File::create(&path)
                    .await
                    .map_err(|e| AppError::persistence(&path, e))?;
                String::new()
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let entries: HashSet<String> = content.lines().filter_map(cache_key).collect();
        let needs_newline = !content.is_empty() && !content.ends_with('\n');

        log::debug!("Loaded {} cached identifier(s) from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries,
            needs_newline,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an identifier durably, then add it to the in-memory set.
    pub async fn append(&mut self, id: &str) -> Result<()> {
        let id = id.trim();
        if self.entries.contains(id) {
            return Ok(());
        }

        let mut line = String::with_capacity(id.len() + 2);
        if self.needs_newline {
            line.push('\n');
        }
        line.push_str(id);
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;
        file.sync_data()
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;

        self.needs_newline = false;
        self.entries.insert(id.to_string());
        Ok(())
    }
}

/// Create the parent directory of a file path if it has one.
pub(crate) async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::persistence(parent, e))?;
        }
    }
    Ok(())
}
