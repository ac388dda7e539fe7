// src/services/orchestrator.rs

//! Crawl orchestrator.
//!
//! Lists departments once, then runs one worker per department behind a
//! bounded concurrency gate. A worker searches its department's courses,
//! fetches and parses each course's prerequisites in sequence, and appends
//! the finished batch to the [`CatalogAggregator`] in one call.
//!
//! A failed department or course listing is fatal: the worker stream is
//! dropped, which cancels the remaining workers before they append anything.
//! A failed prerequisite fetch or parse only marks that course unparseable.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, CourseRecord, CourseStub, Department, SearchRequest};
use crate::services::aggregator::CatalogAggregator;
use crate::services::collaborators::{CourseListFetcher, DepartmentLister, PrereqFetcher};
use crate::services::prereqs::PrereqParser;
use crate::services::scanner::{FragmentScanner, HtmlScanner};
use crate::utils::course_code::normalize;

/// Lifecycle of a department worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Pending,
    ListingCourses,
    FetchingPrereqs,
    Done,
    Failed,
}

impl WorkerState {
    /// Whether `next` is a legal transition from this state.
    pub fn can_advance_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Pending, ListingCourses)
                | (ListingCourses, FetchingPrereqs)
                | (ListingCourses, Failed)
                | (FetchingPrereqs, Done)
        )
    }
}

/// Outcome of one department worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentReport {
    pub code: String,
    pub state: WorkerState,
    pub course_count: usize,
    pub unparseable_count: usize,
}

/// Run parameters for the orchestrator.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub term: String,
    pub max_concurrent: usize,
    pub request_delay: Duration,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            term: config.site.term.clone(),
            max_concurrent: config.crawler.max_concurrent.max(1),
            request_delay: Duration::from_millis(config.crawler.request_delay_ms),
        }
    }
}

/// Drives the per-department crawl.
pub struct CrawlOrchestrator<S = HtmlScanner> {
    lister: Arc<dyn DepartmentLister>,
    courses: Arc<dyn CourseListFetcher>,
    prereqs: Arc<dyn PrereqFetcher>,
    parser: PrereqParser<S>,
    settings: CrawlSettings,
}

impl<S: FragmentScanner> CrawlOrchestrator<S> {
    pub fn new(
        lister: Arc<dyn DepartmentLister>,
        courses: Arc<dyn CourseListFetcher>,
        prereqs: Arc<dyn PrereqFetcher>,
        parser: PrereqParser<S>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            lister,
            courses,
            prereqs,
            parser,
            settings,
        }
    }

    /// Term being crawled.
    pub fn term(&self) -> &str {
        &self.settings.term
    }

    /// List departments and crawl all of them into `aggregator`.
    pub async fn run(&self, aggregator: &CatalogAggregator) -> Result<Vec<DepartmentReport>> {
        let departments = self
            .lister
            .list(&self.settings.term)
            .await
            .map_err(|e| e.context(format!("departments of {}", self.settings.term)))?;

        log::info!(
            "Found {} departments for term {}",
            departments.len(),
            self.settings.term
        );

        self.crawl_departments(&departments, aggregator).await
    }

    /// Crawl the given departments, at most `max_concurrent` at a time.
    ///
    /// Reports are returned in completion order.
    pub async fn crawl_departments(
        &self,
        departments: &[Department],
        aggregator: &CatalogAggregator,
    ) -> Result<Vec<DepartmentReport>> {
        let total = departments.len();
        let mut workers = stream::iter(departments.iter().enumerate())
            .map(|(i, dept)| self.crawl_department(dept, i + 1, total, aggregator))
            .buffer_unordered(self.settings.max_concurrent);

        let mut reports = Vec::with_capacity(total);
        while let Some(result) = workers.next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    log::error!(
                        "Aborting crawl after {} of {} departments: {}",
                        reports.len(),
                        total,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(reports)
    }

    async fn crawl_department(
        &self,
        dept: &Department,
        position: usize,
        total: usize,
        aggregator: &CatalogAggregator,
    ) -> Result<DepartmentReport> {
        let mut state = WorkerState::Pending;
        advance(&dept.code, &mut state, WorkerState::ListingCourses);

        log::info!(
            "Searching courses for department {} ({}/{})",
            dept.code,
            position,
            total
        );

        let request = SearchRequest::for_department(&self.settings.term, &dept.code);
        let stubs = match self.courses.fetch(&request).await {
            Ok(stubs) => stubs,
            Err(e) => {
                advance(&dept.code, &mut state, WorkerState::Failed);
                return Err(e.context(format!("department {}", dept.code)));
            }
        };

        advance(&dept.code, &mut state, WorkerState::FetchingPrereqs);

        let mut batch = Vec::with_capacity(stubs.len());
        for (i, stub) in stubs.into_iter().enumerate() {
            if i > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }
            batch.push(self.build_record(&dept.code, stub).await);
        }

        let course_count = batch.len();
        let unparseable_count = batch.iter().filter(|r| !r.parseable).count();
        aggregator.append_batch(batch);

        advance(&dept.code, &mut state, WorkerState::Done);
        log::info!(
            "Collected prerequisites for department {} ({} courses, {} unparseable)",
            dept.code,
            course_count,
            unparseable_count
        );

        Ok(DepartmentReport {
            code: dept.code.clone(),
            state,
            course_count,
            unparseable_count,
        })
    }

    /// Fetch and parse one course; failures downgrade the record.
    async fn build_record(&self, department: &str, stub: CourseStub) -> CourseRecord {
        let course_id = normalize(&stub.code);
        let stub = CourseStub {
            code: course_id.clone(),
            ..stub
        };

        let fragment = match self.prereqs.fetch(&self.settings.term, &course_id).await {
            Ok(fragment) => fragment,
            Err(e) => {
                log::warn!("Prerequisite fetch failed for {}: {}", course_id, e);
                return CourseRecord::unparseable(stub, department);
            }
        };

        match self.parser.parse_fragment(&fragment) {
            Ok(parsed) => CourseRecord::parsed(stub, department, parsed.tree, parsed.raw_text),
            Err(e) => {
                log::warn!("Prerequisite parse failed for {}: {}", course_id, e);
                CourseRecord::unparseable(stub, department)
            }
        }
    }
}

fn advance(department: &str, state: &mut WorkerState, next: WorkerState) {
    debug_assert!(
        state.can_advance_to(next),
        "illegal worker transition {state:?} -> {next:?}"
    );
    log::debug!("Department {}: {:?} -> {:?}", department, state, next);
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::AppError;
    use crate::models::{PageSelectors, PrereqNode};

    struct FakeLister(Option<Vec<Department>>);

    #[async_trait]
    impl DepartmentLister for FakeLister {
        async fn list(&self, _term: &str) -> Result<Vec<Department>> {
            self.0
                .clone()
                .ok_or_else(|| AppError::crawl("department list", "invalid JSON"))
        }
    }

    /// Course lists keyed by department; unknown departments fail.
    #[derive(Default)]
    struct FakeCourses {
        lists: HashMap<String, Vec<CourseStub>>,
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl CourseListFetcher for FakeCourses {
        async fn fetch(&self, request: &SearchRequest) -> Result<Vec<CourseStub>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let code = &request.departments[0];
            self.lists
                .get(code)
                .cloned()
                .ok_or_else(|| AppError::session(format!("search for {code} failed")))
        }
    }

    /// Fragments keyed by course id; unknown courses fail.
    #[derive(Default)]
    struct FakePrereqs {
        fragments: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PrereqFetcher for FakePrereqs {
        async fn fetch(&self, _term: &str, course_id: &str) -> Result<String> {
            self.requested.lock().unwrap().push(course_id.to_string());
            self.fragments
                .get(course_id)
                .cloned()
                .ok_or_else(|| AppError::crawl(course_id, "timed out"))
        }
    }

    fn dept(code: &str) -> Department {
        Department {
            code: code.to_string(),
            expansion: format!("Department of {code}"),
        }
    }

    fn stub(code: &str) -> CourseStub {
        CourseStub {
            code: code.to_string(),
            title: format!("Title of {code}"),
        }
    }

    fn fragment(rows: &str) -> String {
        format!("<html><body><table>{rows}</table></body></html>")
    }

    fn settings(max_concurrent: usize) -> CrawlSettings {
        CrawlSettings {
            term: "SP26".to_string(),
            max_concurrent,
            request_delay: Duration::ZERO,
        }
    }

    fn orchestrator(
        lister: FakeLister,
        courses: Arc<FakeCourses>,
        prereqs: Arc<FakePrereqs>,
        max_concurrent: usize,
    ) -> CrawlOrchestrator {
        CrawlOrchestrator::new(
            Arc::new(lister),
            courses,
            prereqs,
            PrereqParser::from_selectors(&PageSelectors::default()).unwrap(),
            settings(max_concurrent),
        )
    }

    #[test]
    fn test_worker_transitions() {
        use WorkerState::*;
        assert!(Pending.can_advance_to(ListingCourses));
        assert!(ListingCourses.can_advance_to(Failed));
        assert!(FetchingPrereqs.can_advance_to(Done));
        assert!(!Pending.can_advance_to(Done));
        assert!(!Done.can_advance_to(ListingCourses));
    }

    #[tokio::test]
    async fn test_failed_prereq_fetch_downgrades_only_that_course() {
        let mut courses = FakeCourses::default();
        courses.lists.insert(
            "CSE".into(),
            vec![stub("CSE 12"), stub("CSE 100"), stub("CSE 101")],
        );
        let mut prereqs = FakePrereqs::default();
        prereqs.fragments.insert("CSE 12".into(), fragment(""));
        prereqs.fragments.insert(
            "CSE 101".into(),
            fragment(r#"<tr><td>1.</td><td><span class="bold_text">CSE 100</span></td></tr>"#),
        );

        let orchestrator = orchestrator(
            FakeLister(Some(vec![dept("CSE")])),
            Arc::new(courses),
            Arc::new(prereqs),
            4,
        );
        let aggregator = CatalogAggregator::new();
        let reports = orchestrator.run(&aggregator).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].state, WorkerState::Done);
        assert_eq!(reports[0].course_count, 3);
        assert_eq!(reports[0].unparseable_count, 1);

        let snapshot = aggregator.finalize();
        let records = snapshot.records();
        assert_eq!(records[0].prereq_tree, Some(PrereqNode::empty()));
        assert!(!records[1].parseable);
        assert!(records[1].prereq_tree.is_none());
        assert!(records[2].parseable);
        assert_eq!(records[2].prereq_tree.as_ref().unwrap().course_ids(), vec!["CSE 100"]);
        assert!(records.iter().all(|r| r.department == "CSE"));
    }

    #[tokio::test]
    async fn test_course_ids_normalized_before_fetch() {
        let mut courses = FakeCourses::default();
        courses
            .lists
            .insert("BILD".into(), vec![stub("BILD-1"), stub("BILD  2")]);
        let prereqs = Arc::new(FakePrereqs::default());

        let orchestrator = orchestrator(
            FakeLister(Some(vec![dept("BILD")])),
            Arc::new(courses),
            Arc::clone(&prereqs),
            1,
        );
        let aggregator = CatalogAggregator::new();
        orchestrator.run(&aggregator).await.unwrap();

        assert_eq!(*prereqs.requested.lock().unwrap(), vec!["BILD 1", "BILD 2"]);
        let snapshot = aggregator.finalize();
        assert_eq!(snapshot.records()[0].code, "BILD 1");
    }

    #[tokio::test]
    async fn test_every_department_appends_one_batch() {
        let mut courses = FakeCourses::default();
        let mut prereqs = FakePrereqs::default();
        let codes = ["CSE", "ECE", "MATH", "PHYS", "CHEM", "BILD"];
        for code in codes {
            let stubs: Vec<_> = (1..=5).map(|n| stub(&format!("{code} {n}"))).collect();
            for s in &stubs {
                prereqs.fragments.insert(s.code.clone(), fragment(""));
            }
            courses.lists.insert(code.into(), stubs);
        }

        let departments: Vec<_> = codes.iter().map(|c| dept(c)).collect();
        let orchestrator = orchestrator(
            FakeLister(Some(departments)),
            Arc::new(courses),
            Arc::new(prereqs),
            3,
        );
        let aggregator = CatalogAggregator::new();
        let reports = orchestrator.run(&aggregator).await.unwrap();
        assert_eq!(reports.len(), codes.len());

        let snapshot = aggregator.finalize();
        assert_eq!(snapshot.len(), codes.len() * 5);
        for run in snapshot.records().chunks(5) {
            assert!(run.iter().all(|r| r.department == run[0].department));
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut courses = FakeCourses {
            delay: Duration::from_millis(10),
            ..FakeCourses::default()
        };
        let departments: Vec<_> = (0..12).map(|i| dept(&format!("D{i}"))).collect();
        for d in &departments {
            courses.lists.insert(d.code.clone(), Vec::new());
        }
        let courses = Arc::new(courses);

        let orchestrator = orchestrator(
            FakeLister(Some(departments)),
            Arc::clone(&courses),
            Arc::new(FakePrereqs::default()),
            3,
        );
        orchestrator.run(&CatalogAggregator::new()).await.unwrap();

        let peak = courses.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded the limit");
        assert!(peak >= 2);
    }

    #[tokio::test]
    async fn test_course_list_failure_aborts_run() {
        let mut courses = FakeCourses::default();
        courses.lists.insert("CSE".into(), vec![stub("CSE 11")]);
        let mut prereqs = FakePrereqs::default();
        prereqs.fragments.insert("CSE 11".into(), fragment(""));

        let orchestrator = orchestrator(
            FakeLister(Some(vec![dept("CSE"), dept("BROKEN")])),
            Arc::new(courses),
            Arc::new(prereqs),
            1,
        );
        let aggregator = CatalogAggregator::new();
        let err = orchestrator.run(&aggregator).await.unwrap_err();
        assert!(err.to_string().contains("department BROKEN"));
        assert_eq!(err.to_string().matches("Crawl error").count(), 1);

        // Only the completed department's batch was appended.
        let snapshot = aggregator.finalize();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].code, "CSE 11");
    }

    #[tokio::test]
    async fn test_department_list_failure_is_fatal() {
        let courses = Arc::new(FakeCourses::default());
        let orchestrator = orchestrator(
            FakeLister(None),
            Arc::clone(&courses),
            Arc::new(FakePrereqs::default()),
            2,
        );
        let aggregator = CatalogAggregator::new();
        let err = orchestrator.run(&aggregator).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Crawl error for departments of SP26 (department list): invalid JSON"
        );
        assert!(aggregator.is_empty());
        assert_eq!(courses.max_in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_department_list_is_not_an_error() {
        let orchestrator = orchestrator(
            FakeLister(Some(Vec::new())),
            Arc::new(FakeCourses::default()),
            Arc::new(FakePrereqs::default()),
            2,
        );
        let aggregator = CatalogAggregator::new();
        assert!(orchestrator.run(&aggregator).await.unwrap().is_empty());
        assert!(aggregator.is_empty());
    }
}
