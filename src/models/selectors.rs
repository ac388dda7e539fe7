// src/models/selectors.rs

//! CSS selectors for scraping schedule-of-classes pages.

use serde::{Deserialize, Serialize};

/// CSS selectors for the prerequisite and search-results pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSelectors {
    /// Selector for each row of the prerequisite table
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Selector for the cells within a row (first is the label, second the requirement)
    #[serde(default = "defaults::cell_selector")]
    pub cell_selector: String,

    /// Selector for a marked course-code span within the requirement cell
    #[serde(default = "defaults::course_selector")]
    pub course_selector: String,

    /// Selector for marker tokens ("or") within the requirement cell
    #[serde(default = "defaults::marker_selector")]
    pub marker_selector: String,

    /// Marker text that turns a row into an OR group
    #[serde(default = "defaults::or_token")]
    pub or_token: String,

    /// Selector for search-result rows
    #[serde(default = "defaults::results_selector")]
    pub results_selector: String,

    /// Selector for subject headings on the search-result page
    #[serde(default = "defaults::header_selector")]
    pub header_selector: String,

    /// Selector for the course header cells of a search-result row
    #[serde(default = "defaults::course_header_selector")]
    pub course_header_selector: String,

    /// Class of section rows, which are not course rows
    #[serde(default = "defaults::section_row_class")]
    pub section_row_class: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            cell_selector: defaults::cell_selector(),
            course_selector: defaults::course_selector(),
            marker_selector: defaults::marker_selector(),
            or_token: defaults::or_token(),
            results_selector: defaults::results_selector(),
            header_selector: defaults::header_selector(),
            course_header_selector: defaults::course_header_selector(),
            section_row_class: defaults::section_row_class(),
        }
    }
}

impl PageSelectors {
    /// All selector strings, for validation.
    pub fn all(&self) -> [&str; 7] {
        [
            &self.row_selector,
            &self.cell_selector,
            &self.course_selector,
            &self.marker_selector,
            &self.results_selector,
            &self.header_selector,
            &self.course_header_selector,
        ]
    }
}

mod defaults {
    pub fn row_selector() -> String {
        "table tr".into()
    }
    pub fn cell_selector() -> String {
        "td".into()
    }
    pub fn course_selector() -> String {
        "span.bold_text".into()
    }
    pub fn marker_selector() -> String {
        "span.ertext".into()
    }
    pub fn or_token() -> String {
        "or".into()
    }
    pub fn results_selector() -> String {
        "table.tbrdr tr".into()
    }
    pub fn header_selector() -> String {
        "h2".into()
    }
    pub fn course_header_selector() -> String {
        "td.crsheader".into()
    }
    pub fn section_row_class() -> String {
        "sectxt".into()
    }
}
