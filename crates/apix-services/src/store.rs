//! Append-only store service.
//!
//! Writes every payload it receives to a file as
//! `"\n<RFC 3339 timestamp> - <payload>"`. Answers 201 on success and 500
//! when the write fails. It never transforms the payload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use apix_platform::fs::FileSystem;
use apix_types::config::StoreServiceConfig;
use apix_types::request::StageResult;

use crate::error::Result;

/// Status answered after a successful write.
pub const STORED_STATUS: u16 = 201;

/// Status answered when the write fails.
pub const FAILED_STATUS: u16 = 500;

/// Appends payloads to a file.
pub struct StoreService {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl StoreService {
    /// Create a store writing to `path`.
    pub fn new(fs: Arc<dyn FileSystem>, path: PathBuf) -> Self {
        Self { fs, path }
    }

    /// Create a store from its configuration section.
    pub fn from_config(fs: Arc<dyn FileSystem>, config: &StoreServiceConfig) -> Self {
        Self::new(fs, config.resolved_path())
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub async fn store(&self, payload: &[u8]) -> Result<()> {
        let record = format!(
            "\n{} - {}",
            chrono::Utc::now().to_rfc3339(),
            String::from_utf8_lossy(payload)
        );
        self.fs.append_string(&self.path, &record).await?;
        Ok(())
    }

    /// Store a payload and answer with the stage contract.
    pub async fn handle(&self, payload: &[u8]) -> StageResult {
        match self.store(payload).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), bytes = payload.len(), "payload stored");
                StageResult::new(STORED_STATUS, "stored")
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "store write failed");
                StageResult::new(FAILED_STATUS, "store write failed")
            }
        }
    }
}
