//! Output data structures for the persisted catalog document.
//!
//! The document is a JSON array with one wrapped entry per course:
//!
//! ```json
//! [
//!   {
//!     "meta": { "version": "2026-03-01", "generated_at": "2026-03-01T12:30:00Z", "term": "SP26" },
//!     "course": {
//!       "code": "CSE 100",
//!       "title": "Advanced Data Structures",
//!       "raw_prereq": "1. CSE 12 or CSE 15L",
//!       "parseable": true,
//!       "prereq": { "type": "AND", "items": [ ... ] }
//!     }
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::models::{CatalogSnapshot, CourseRecord, PrereqNode, SnapshotMetadata};

/// One course entry in the persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseWritable {
    pub meta: SnapshotMetadata,
    pub course: CourseOutput,
}

/// Course fields as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutput {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub raw_prereq: String,
    pub parseable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prereq: Option<PrereqNode>,
}

impl From<&CourseRecord> for CourseOutput {
    fn from(record: &CourseRecord) -> Self {
        Self {
            code: record.code.clone(),
            title: record.title.clone(),
            raw_prereq: record.raw_prereq_text.clone(),
            parseable: record.parseable,
            prereq: record.prereq_tree.clone(),
        }
    }
}

impl CatalogSnapshot {
    /// Convert to the on-disk document shape.
    pub fn to_output(&self) -> Vec<CourseWritable> {
        self.records()
            .iter()
            .map(|record| CourseWritable {
                meta: self.metadata().clone(),
                course: CourseOutput::from(record),
            })
            .collect()
    }

    /// Rebuild a snapshot from a persisted document.
    ///
    /// Metadata is taken from the first entry. Department codes are not
    /// persisted, so restored records carry an empty department.
    pub fn from_output(entries: Vec<CourseWritable>) -> Option<Self> {
        let metadata = entries.first()?.meta.clone();
        let records = entries
            .into_iter()
            .map(|entry| {
                let course = entry.course;
                CourseRecord {
                    code: course.code,
                    title: course.title,
                    raw_prereq_text: course.raw_prereq,
                    parseable: course.parseable,
                    prereq_tree: if course.parseable { course.prereq } else { None },
                    department: String::new(),
                }
            })
            .collect();
        Some(Self::new(metadata, records))
    }
}
