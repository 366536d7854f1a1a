//! Whole-document JSON file storage.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::DbConfig;
use crate::error::DbError;

use super::io_utils::{classify_io_error, retry_io_operation};

/// A single JSON document on disk.
///
/// Reads parse the whole file; writes replace the whole file by writing a
/// sibling `.tmp` file and renaming it over the target, so readers observe
/// either the old or the new document.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    config: DbConfig,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>, config: DbConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the temporary file used during writes.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Returns whether the file exists.
    pub async fn exists(&self) -> Result<bool, DbError> {
        tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| classify_io_error(e, "Failed to stat database file"))
    }

    /// Reads and parses the document.
    pub async fn read<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            classify_io_error(e, &format!("Failed to read {}", self.path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            DbError::ParseError(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }

    /// Encodes a document the way [`JsonFile::write`] would store it.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, DbError> {
        let encoded = if self.config.pretty_json {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| DbError::EncodeError(e.to_string()))
    }

    /// Encodes and writes a document, replacing the file.
    pub async fn write<T: Serialize>(&self, value: &T) -> Result<(), DbError> {
        let bytes = self.encode(value)?;
        self.write_bytes(&bytes).await
    }

    /// Replaces the file with already encoded bytes.
    pub async fn write_bytes(&self, bytes: &[u8]) -> Result<(), DbError> {
        retry_io_operation(
            move || self.write_bytes_internal(bytes),
            self.config.persistence_max_retries,
            self.config.persistence_retry_delay_ms,
            "write_bytes",
        )
        .await
    }

    async fn write_bytes_internal(&self, bytes: &[u8]) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;
            }
        }

        // Write to temporary file first
        let temp_path = self.temp_path();
        let result = self.write_and_rename(&temp_path, bytes).await;
        if result.is_err() {
            // Best effort; the original error is what matters
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove {}: {}", temp_path.display(), e);
                }
            }
        }
        result?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    async fn write_and_rename(&self, temp_path: &Path, bytes: &[u8]) -> Result<(), DbError> {
        tokio::fs::write(temp_path, bytes)
            .await
            .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;

        if self.config.sync_on_write {
            let file = tokio::fs::OpenOptions::new()
                .write(true)
                .open(temp_path)
                .await
                .map_err(|e| classify_io_error(e, "Failed to reopen temp file"))?;
            file.sync_all()
                .await
                .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;
        }

        // Atomic rename
        tokio::fs::rename(temp_path, &self.path)
            .await
            .map_err(|e| classify_io_error(e, "Failed to rename temp file"))
    }
}
