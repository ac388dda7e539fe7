// src/services/schedule.rs

//! Schedule-of-classes client.
//!
//! Implements the department, course-list, and prerequisite collaborators
//! on top of a [`SessionProvider`].

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{CourseStub, Department, PageSelectors, SearchRequest, SiteConfig};
use crate::services::collaborators::{CourseListFetcher, DepartmentLister, PrereqFetcher};
use crate::services::scanner::parse_selector;
use crate::services::session::SessionProvider;
use crate::utils::collapse_whitespace;
use crate::utils::course_code::compact;

/// Client for the scheduling site's department, search, and prerequisite pages.
pub struct ScheduleClient {
    session: Arc<dyn SessionProvider>,
    site: SiteConfig,
    results: ResultsPageParser,
    // The site keeps the last search in the session, so a search POST and
    // the results GET that follows it must not interleave with another pair.
    search_lock: Mutex<()>,
}

impl ScheduleClient {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        site: &SiteConfig,
        selectors: &PageSelectors,
    ) -> Result<Self> {
        Ok(Self {
            session,
            site: site.clone(),
            results: ResultsPageParser::new(selectors)?,
            search_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl DepartmentLister for ScheduleClient {
    async fn list(&self, term: &str) -> Result<Vec<Department>> {
        let mut url = self.site.endpoint(&self.site.department_list_path)?;
        url.query_pairs_mut().append_pair("selectedTerm", term);

        let body = self
            .session
            .get(&url)
            .await
            .map_err(|e| AppError::crawl("department list", e))?;
        let departments: Vec<Department> = serde_json::from_str(&body)
            .map_err(|e| AppError::crawl("department list", format!("invalid JSON: {e}")))?;

        Ok(departments
            .into_iter()
            .filter(|d| !d.code.is_empty())
            .collect())
    }
}

#[async_trait]
impl CourseListFetcher for ScheduleClient {
    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<CourseStub>> {
        let search_url = self.site.endpoint(&self.site.search_path)?;
        let results_url = self.site.endpoint(&self.site.results_path)?;
        let form = request.to_form();

        let body = {
            let _guard = self.search_lock.lock().await;
            self.session.post_form(&search_url, &form).await?;
            self.session.get(&results_url).await?
        };

        self.results.parse(&body, &self.site.no_results_marker)
    }
}

#[async_trait]
impl PrereqFetcher for ScheduleClient {
    async fn fetch(&self, term: &str, course_id: &str) -> Result<String> {
        let mut url = self.site.endpoint(&self.site.prereq_path)?;
        url.query_pairs_mut()
            .append_pair("termCode", term)
            .append_pair("courseId", &compact(course_id));

        let body = self.session.get(&url).await?;
        if body.trim().is_empty() {
            return Err(AppError::crawl(
                format!("prerequisites of {course_id}"),
                "empty response body",
            ));
        }
        Ok(body)
    }
}

/// Parser for the printable search-results page.
struct ResultsPageParser {
    walk: Selector,
    rows: Selector,
    header: Selector,
    course_header: Selector,
    section_row_class: String,
    subject: Regex,
}

impl ResultsPageParser {
    fn new(selectors: &PageSelectors) -> Result<Self> {
        Ok(Self {
            walk: parse_selector(&format!(
                "{}, {}",
                selectors.header_selector, selectors.results_selector
            ))?,
            rows: parse_selector(&selectors.results_selector)?,
            header: parse_selector(&selectors.header_selector)?,
            course_header: parse_selector(&selectors.course_header_selector)?,
            section_row_class: selectors.section_row_class.clone(),
            subject: Regex::new(r"\((.*?)\)")?,
        })
    }

    /// Extract course stubs in document order, without duplicates.
    ///
    /// A page with neither result rows nor the no-results notice is an error.
    fn parse(&self, body: &str, no_results_marker: &str) -> Result<Vec<CourseStub>> {
        let document = Html::parse_document(body);

        if document.select(&self.rows).next().is_none() {
            if !no_results_marker.is_empty() && body.contains(no_results_marker) {
                return Ok(Vec::new());
            }
            return Err(AppError::crawl(
                "course list",
                "results page has neither result rows nor a no-results notice",
            ));
        }

        let mut subject = String::new();
        let mut seen = HashSet::new();
        let mut courses = Vec::new();

        for element in document.select(&self.walk) {
            if self.header.matches(&element) {
                if let Some(caps) = self.subject.captures(&text(element)) {
                    subject = caps[1].trim().to_string();
                }
                continue;
            }

            if subject.is_empty() || self.is_section_row(element) {
                continue;
            }

            let cells: Vec<_> = element.select(&self.course_header).collect();
            let Some(number) = cells.get(1).map(|cell| text(*cell)) else {
                continue;
            };
            if number.is_empty() {
                continue;
            }

            let code = format!("{subject} {number}");
            if seen.insert(code.clone()) {
                courses.push(CourseStub {
                    code,
                    title: cells.get(2).map(|cell| text(*cell)).unwrap_or_default(),
                });
            }
        }

        Ok(courses)
    }

    fn is_section_row(&self, element: ElementRef) -> bool {
        element
            .value()
            .classes()
            .any(|class| class == self.section_row_class)
    }
}

fn text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
