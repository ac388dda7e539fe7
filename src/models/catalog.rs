// src/models/catalog.rs

//! Department, course, and prerequisite tree data structures.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An academic department as listed by the scheduling site.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Department {
    /// Subject code (e.g., "CSE")
    #[serde(deserialize_with = "trimmed")]
    pub code: String,

    /// Full department name
    #[serde(rename = "value", default)]
    pub expansion: String,
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

/// A course as it appears in a department's search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseStub {
    pub code: String,
    pub title: String,
}

/// A node in a prerequisite logic tree.
///
/// Only `Course` carries a course id and only `And`/`Or` carry children,
/// so a node can never be both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum PrereqNode {
    And { items: Vec<PrereqNode> },
    Or { items: Vec<PrereqNode> },
    Course { course_id: String },
}

impl PrereqNode {
    /// An `AND` root with no children, meaning "no prerequisites".
    pub fn empty() -> Self {
        Self::And { items: Vec::new() }
    }

    pub fn course(course_id: impl Into<String>) -> Self {
        Self::Course {
            course_id: course_id.into(),
        }
    }

    /// Children of an internal node; empty for a leaf.
    pub fn items(&self) -> &[PrereqNode] {
        match self {
            Self::And { items } | Self::Or { items } => items,
            Self::Course { .. } => &[],
        }
    }

    /// True for an `AND` node without children.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::And { items } if items.is_empty())
    }

    /// All course ids in the tree, depth first.
    pub fn course_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut Vec<&'a str>) {
        match self {
            Self::Course { course_id } => ids.push(course_id),
            Self::And { items } | Self::Or { items } => {
                for item in items {
                    item.collect_ids(ids);
                }
            }
        }
    }
}

/// A fully processed course, ready for aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRecord {
    pub code: String,
    pub title: String,
    pub raw_prereq_text: String,
    pub parseable: bool,
    pub prereq_tree: Option<PrereqNode>,
    pub department: String,
}

impl CourseRecord {
    /// Record for a course whose prerequisites were parsed.
    pub fn parsed(
        stub: CourseStub,
        department: impl Into<String>,
        tree: PrereqNode,
        raw_prereq_text: String,
    ) -> Self {
        Self {
            code: stub.code,
            title: stub.title,
            raw_prereq_text,
            parseable: true,
            prereq_tree: Some(tree),
            department: department.into(),
        }
    }

    /// Record for a course whose prerequisites could not be fetched or parsed.
    pub fn unparseable(stub: CourseStub, department: impl Into<String>) -> Self {
        Self {
            code: stub.code,
            title: stub.title,
            raw_prereq_text: String::new(),
            parseable: false,
            prereq_tree: None,
            department: department.into(),
        }
    }
}

/// Snapshot metadata written with every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Local calendar date of the crawl (YYYY-MM-DD)
    pub version: String,

    /// UTC timestamp in RFC 3339 form
    pub generated_at: String,

    /// Term the catalog was crawled for; empty when unknown
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub term: String,
}

impl SnapshotMetadata {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            version: now.with_timezone(&Local).format("%Y-%m-%d").to_string(),
            generated_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            term: String::new(),
        }
    }
}

/// The final, immutable catalog produced once per crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    metadata: SnapshotMetadata,
    records: Vec<CourseRecord>,
}

impl CatalogSnapshot {
    pub fn new(metadata: SnapshotMetadata, records: Vec<CourseRecord>) -> Self {
        Self { metadata, records }
    }

    /// Tag the snapshot with the term it was crawled for.
    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.metadata.term = term.into();
        self
    }

    pub fn metadata(&self) -> &SnapshotMetadata {
        &self.metadata
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose prerequisites could not be parsed.
    pub fn unparseable_count(&self) -> usize {
        self.records.iter().filter(|r| !r.parseable).count()
    }
}

/// Statistics for a single crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStats {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub department_count: usize,
    pub course_count: usize,
    pub unparseable_count: usize,
}

impl CrawlStats {
    /// Share of courses whose prerequisites parsed, in `[0, 1]`.
    pub fn parse_rate(&self) -> f64 {
        if self.course_count == 0 {
            return 1.0;
        }
        (self.course_count - self.unparseable_count) as f64 / self.course_count as f64
    }
}
