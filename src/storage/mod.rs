//! Storage abstractions for catalog persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml              # Crawler configuration
//! ├── SOC_list.json            # Latest complete catalog
//! ├── SOC_list.partial.json    # Completed batches of an aborted run
//! └── stats.json               # Statistics of the last complete run
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CatalogSnapshot, CrawlStats};

pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Number of course entries written
    pub record_count: usize,
    /// Where the document was written
    pub location: String,
    /// Timestamp of the write
    pub timestamp: DateTime<Utc>,
}

/// Trait for catalog storage backends.
#[async_trait]
pub trait CatalogSink: Send + Sync {
    /// Replace the main catalog document with a complete snapshot.
    async fn write_snapshot(
        &self,
        snapshot: &CatalogSnapshot,
        stats: &CrawlStats,
    ) -> Result<WriteMetadata>;

    /// Write the completed batches of an aborted run.
    ///
    /// Never touches the main catalog document.
    async fn write_partial(&self, snapshot: &CatalogSnapshot) -> Result<WriteMetadata>;

    /// Load the last complete snapshot, if one was written.
    async fn load_snapshot(&self) -> Result<Option<CatalogSnapshot>>;
}
