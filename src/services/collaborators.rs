//! Capability contracts consumed by the crawl orchestrator.
//!
//! Every call returns an explicit `Result`: an empty `Ok` means the site
//! reported nothing, an `Err` means the call itself failed.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CourseStub, Department, SearchRequest};

/// Lists the departments offering courses in a term.
#[async_trait]
pub trait DepartmentLister: Send + Sync {
    async fn list(&self, term: &str) -> Result<Vec<Department>>;
}

/// Lists the courses matched by a search request.
#[async_trait]
pub trait CourseListFetcher: Send + Sync {
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<CourseStub>>;
}

/// Fetches the prerequisite fragment of one course.
#[async_trait]
pub trait PrereqFetcher: Send + Sync {
    async fn fetch(&self, term: &str, course_id: &str) -> Result<String>;
}
