//! Service layer for the catalog crawler.
//!
//! This module contains the business logic for:
//! - Site access (`HttpSession`, `ScheduleClient`)
//! - Prerequisite parsing (`HtmlScanner`, `PrereqParser`)
//! - Record collection (`CatalogAggregator`)
//! - Per-department crawling (`CrawlOrchestrator`)

pub mod aggregator;
pub mod collaborators;
pub mod orchestrator;
pub mod prereqs;
pub mod scanner;
pub mod schedule;
pub mod session;

pub use aggregator::CatalogAggregator;
pub use collaborators::{CourseListFetcher, DepartmentLister, PrereqFetcher};
pub use orchestrator::{CrawlOrchestrator, CrawlSettings, DepartmentReport, WorkerState};
pub use prereqs::{ParsedPrereqs, PrereqParser};
pub use scanner::{FragmentScanner, HtmlScanner, ScannedRow};
pub use schedule::ScheduleClient;
pub use session::{HttpSession, SessionProvider};
