//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Crawl every department and persist the catalog
//! - `parse_file`: Parse a saved prerequisite page
//! - `run_validate`: Check configuration

pub mod circuit_breaker;
pub mod crawl;
pub mod parse;
pub mod validate;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerResult};
pub use crawl::{CrawlSummary, crawl_and_store, run_crawler};
pub use parse::parse_file;
pub use validate::run_validate;
