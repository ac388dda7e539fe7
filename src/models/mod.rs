// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod catalog;
mod config;
mod output;
mod search;
mod selectors;

// Re-export all public types
pub use catalog::{
    CatalogSnapshot, CourseRecord, CourseStub, CrawlStats, Department, PrereqNode,
    SnapshotMetadata,
};
pub use config::{Config, CrawlerConfig, OutputConfig, SiteConfig};
pub use output::{CourseOutput, CourseWritable};
pub use search::{SearchRequest, SearchTab};
pub use selectors::PageSelectors;
