//! Local filesystem storage implementation.
//!
//! Every document is written atomically: the bytes go to a sibling `.tmp`
//! file which is then renamed over the target, so a reader never sees a
//! half-written catalog.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CatalogSnapshot, CourseWritable, CrawlStats, OutputConfig, SnapshotMetadata};
use crate::storage::{CatalogSink, WriteMetadata};

const STATS_FILE: &str = "stats.json";

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    file_name: String,
    partial_file_name: String,
    pretty: bool,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, output: &OutputConfig) -> Self {
        Self {
            root_dir: root_dir.into(),
            file_name: output.file_name.clone(),
            partial_file_name: output.partial_file_name.clone(),
            pretty: output.pretty,
        }
    }

    /// Override the main catalog file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Full path of the main catalog document.
    pub fn snapshot_path(&self) -> PathBuf {
        self.path(&self.file_name)
    }

    /// Full path of the partial catalog document.
    pub fn partial_path(&self) -> PathBuf {
        self.path(&self.partial_file_name)
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(value)?
        } else {
            serde_json::to_vec(value)?
        };
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write_document(&self, key: &str, snapshot: &CatalogSnapshot) -> Result<WriteMetadata> {
        let document = snapshot.to_output();
        let path = self.write_json(key, &document).await?;
        Ok(WriteMetadata {
            record_count: document.len(),
            location: path.display().to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl CatalogSink for LocalStorage {
    async fn write_snapshot(
        &self,
        snapshot: &CatalogSnapshot,
        stats: &CrawlStats,
    ) -> Result<WriteMetadata> {
        log::info!("Writing {} courses to {}", snapshot.len(), self.file_name);
        let meta = self.write_document(&self.file_name, snapshot).await?;
        self.write_json(STATS_FILE, stats).await?;
        Ok(meta)
    }

    async fn write_partial(&self, snapshot: &CatalogSnapshot) -> Result<WriteMetadata> {
        log::warn!(
            "Writing {} courses from completed departments to {}",
            snapshot.len(),
            self.partial_file_name
        );
        self.write_document(&self.partial_file_name, snapshot).await
    }

    async fn load_snapshot(&self) -> Result<Option<CatalogSnapshot>> {
        let Some(entries) = self
            .read_json::<Vec<CourseWritable>>(&self.file_name)
            .await?
        else {
            log::warn!("No {} found", self.file_name);
            return Ok(None);
        };

        if let Some(snapshot) = CatalogSnapshot::from_output(entries) {
            return Ok(Some(snapshot));
        }

        // An empty document carries no metadata; date it by the file itself.
        let modified: DateTime<Utc> = tokio::fs::metadata(self.snapshot_path())
            .await?
            .modified()?
            .into();
        Ok(Some(CatalogSnapshot::new(
            SnapshotMetadata::at(modified),
            Vec::new(),
        )))
    }
}
