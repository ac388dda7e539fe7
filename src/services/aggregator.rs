//! Concurrency-safe sink for completed course records.
//!
//! Each department worker appends its whole batch under a single lock
//! acquisition, so batches never interleave. Batch order across workers
//! follows completion order.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::models::{CatalogSnapshot, CourseRecord, SnapshotMetadata};

/// Accumulates department batches into one ordered catalog.
#[derive(Debug, Default)]
pub struct CatalogAggregator {
    records: Mutex<Vec<CourseRecord>>,
}

impl CatalogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch as one contiguous run, preserving its order.
    ///
    /// Returns the number of records held after the append.
    pub fn append_batch(&self, batch: Vec<CourseRecord>) -> usize {
        let mut records = self.lock();
        records.extend(batch);
        records.len()
    }

    /// Number of records appended so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the aggregator and produce the final snapshot.
    pub fn finalize(self) -> CatalogSnapshot {
        self.finalize_at(Utc::now())
    }

    /// Like [`finalize`](Self::finalize) with an explicit generation time.
    pub fn finalize_at(self, now: DateTime<Utc>) -> CatalogSnapshot {
        let records = self
            .records
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        CatalogSnapshot::new(SnapshotMetadata::at(now), records)
    }

    // Poison is ignored: appends never leave a partial batch behind.
    fn lock(&self) -> MutexGuard<'_, Vec<CourseRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::TimeZone;

    use crate::models::{CourseStub, PrereqNode};

    fn batch(dept: &str, size: usize) -> Vec<CourseRecord> {
        (0..size)
            .map(|i| {
                CourseRecord::parsed(
                    CourseStub {
                        code: format!("{dept} {i}"),
                        title: format!("Course {i}"),
                    },
                    dept,
                    PrereqNode::empty(),
                    String::new(),
                )
            })
            .collect()
    }

    /// Every department's records form one contiguous, ordered run.
    fn assert_batches_contiguous(snapshot: &CatalogSnapshot, batch_size: usize) {
        for run in snapshot.records().chunks(batch_size) {
            let dept = &run[0].department;
            for (i, record) in run.iter().enumerate() {
                assert_eq!(&record.department, dept);
                assert_eq!(record.code, format!("{dept} {i}"));
            }
        }
    }

    #[test]
    fn test_append_preserves_batch_order() {
        let aggregator = CatalogAggregator::new();
        assert_eq!(aggregator.append_batch(batch("CSE", 3)), 3);
        assert_eq!(aggregator.append_batch(batch("ECE", 2)), 5);

        let snapshot = aggregator.finalize();
        let codes: Vec<_> = snapshot.records().iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["CSE 0", "CSE 1", "CSE 2", "ECE 0", "ECE 1"]);
    }

    #[test]
    fn test_finalize_empty() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let snapshot = CatalogAggregator::new().finalize_at(now);
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.metadata().generated_at, "2026-01-05T08:00:00Z");
    }

    #[test]
    fn test_concurrent_threads_never_split_batches() {
        const WORKERS: usize = 32;
        const BATCH: usize = 50;

        let aggregator = CatalogAggregator::new();
        std::thread::scope(|scope| {
            for w in 0..WORKERS {
                let aggregator = &aggregator;
                scope.spawn(move || {
                    aggregator.append_batch(batch(&format!("D{w}"), BATCH));
                });
            }
        });

        let snapshot = aggregator.finalize();
        assert_eq!(snapshot.len(), WORKERS * BATCH);

        let unique: HashSet<_> = snapshot.records().iter().map(|r| r.code.clone()).collect();
        assert_eq!(unique.len(), WORKERS * BATCH);
        assert_batches_contiguous(&snapshot, BATCH);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_never_drop_records() {
        const WORKERS: usize = 24;
        const BATCH: usize = 40;

        let aggregator = Arc::new(CatalogAggregator::new());
        let handles: Vec<_> = (0..WORKERS)
            .map(|w| {
                let aggregator = Arc::clone(&aggregator);
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    aggregator.append_batch(batch(&format!("T{w}"), BATCH));
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let aggregator = Arc::try_unwrap(aggregator).unwrap();
        assert_eq!(aggregator.len(), WORKERS * BATCH);
        let snapshot = aggregator.finalize();
        assert_batches_contiguous(&snapshot, BATCH);
    }
}
