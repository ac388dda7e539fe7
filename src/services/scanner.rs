//! Fragment scanning for prerequisite pages.
//!
//! The scanner only locates rows, course-code spans, and marker tokens.
//! Deciding what they mean is left to [`PrereqParser`](super::PrereqParser).

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::PageSelectors;
use crate::utils::collapse_whitespace;

/// One table row of a prerequisite fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedRow {
    /// Text of the row's first cell (e.g., "1.")
    pub label: String,

    /// Marked course codes in the requirement cell, in document order
    pub course_codes: Vec<String>,

    /// Whether the requirement cell carries an explicit "or" marker
    pub has_or_marker: bool,

    /// Requirement cell text, whitespace collapsed
    pub text: String,
}

/// Extracts rows from a prerequisite fragment.
pub trait FragmentScanner {
    fn scan(&self, fragment: &str) -> Result<Vec<ScannedRow>>;
}

/// [`FragmentScanner`] over HTML using CSS selectors.
pub struct HtmlScanner {
    row: Selector,
    cell: Selector,
    course: Selector,
    marker: Selector,
    or_token: String,
}

impl HtmlScanner {
    /// Compile the configured selectors.
    pub fn new(selectors: &PageSelectors) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&selectors.row_selector)?,
            cell: parse_selector(&selectors.cell_selector)?,
            course: parse_selector(&selectors.course_selector)?,
            marker: parse_selector(&selectors.marker_selector)?,
            or_token: selectors.or_token.trim().to_lowercase(),
        })
    }

    fn scan_row(&self, row: ElementRef) -> ScannedRow {
        let mut cells = row.select(&self.cell);
        let label = cells.next().map(element_text).unwrap_or_default();

        let Some(requirement) = cells.next() else {
            return ScannedRow {
                label,
                ..ScannedRow::default()
            };
        };

        let course_codes = requirement
            .select(&self.course)
            .map(element_text)
            .filter(|code| !code.is_empty())
            .collect();

        let has_or_marker = requirement
            .select(&self.marker)
            .any(|marker| element_text(marker).to_lowercase() == self.or_token);

        ScannedRow {
            label,
            course_codes,
            has_or_marker,
            text: element_text(requirement),
        }
    }
}

impl FragmentScanner for HtmlScanner {
    fn scan(&self, fragment: &str) -> Result<Vec<ScannedRow>> {
        if fragment.trim().is_empty() {
            return Err(AppError::parse("prerequisite fragment is empty"));
        }

        let document = Html::parse_document(fragment);
        Ok(document
            .select(&self.row)
            .map(|row| self.scan_row(row))
            .collect())
    }
}

/// Parse a CSS selector, mapping failures to a selector error.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}
