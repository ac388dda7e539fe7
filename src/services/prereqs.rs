// src/services/prereqs.rs

//! Prerequisite parser.
//!
//! Turns a course's prerequisite fragment into an `AND` rooted logic tree.
//! Only rows that open with a numeric label ("1.", "2.") count. Each such
//! row contributes its marked course codes: wrapped in one `OR` node when
//! the row carries an "or" marker, otherwise as direct children of the root.

use regex::Regex;

use crate::error::Result;
use crate::models::{PageSelectors, PrereqNode};
use crate::services::scanner::{FragmentScanner, HtmlScanner, ScannedRow};
use crate::utils::course_code::normalize;

/// Tree plus the requirement text it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrereqs {
    pub tree: PrereqNode,

    /// Labelled rows' text, one row per line
    pub raw_text: String,
}

/// Converts prerequisite fragments into logic trees.
pub struct PrereqParser<S = HtmlScanner> {
    scanner: S,
    label: Regex,
}

impl PrereqParser<HtmlScanner> {
    /// Parser over HTML fragments using the configured selectors.
    pub fn from_selectors(selectors: &PageSelectors) -> Result<Self> {
        Self::new(HtmlScanner::new(selectors)?)
    }
}

impl<S: FragmentScanner> PrereqParser<S> {
    pub fn new(scanner: S) -> Result<Self> {
        Ok(Self {
            scanner,
            label: Regex::new(r"^\d+\.")?,
        })
    }

    /// Parse a fragment into its prerequisite tree.
    pub fn parse(&self, fragment: &str) -> Result<PrereqNode> {
        Ok(self.parse_fragment(fragment)?.tree)
    }

    /// Parse a fragment into its tree and raw requirement text.
    pub fn parse_fragment(&self, fragment: &str) -> Result<ParsedPrereqs> {
        let rows = self.scanner.scan(fragment)?;

        let mut items = Vec::new();
        let mut lines = Vec::new();

        for row in rows.iter().filter(|row| self.is_numbered(row)) {
            lines.push(format!("{} {}", row.label, row.text).trim_end().to_string());

            let courses: Vec<PrereqNode> = row
                .course_codes
                .iter()
                .map(|code| PrereqNode::course(normalize(code)))
                .collect();

            if courses.is_empty() {
                continue;
            }

            if row.has_or_marker {
                items.push(PrereqNode::Or { items: courses });
            } else {
                items.extend(courses);
            }
        }

        Ok(ParsedPrereqs {
            tree: PrereqNode::And { items },
            raw_text: lines.join("\n"),
        })
    }

    fn is_numbered(&self, row: &ScannedRow) -> bool {
        self.label.is_match(row.label.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn parser() -> PrereqParser {
        PrereqParser::from_selectors(&PageSelectors::default()).unwrap()
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
               <h2>Catalog Prerequisites</h2>
               <table>
                 <tr><th>#</th><th>Course Number</th></tr>
                 {rows}
               </table>
               </body></html>"#
        )
    }

    #[test]
    fn test_or_row_becomes_or_group() {
        let html = page(
            r#"<tr><td>1.</td><td>
                 <span class="bold_text">CSE-12</span> Basic Data Structures
                 <span class="ertext">or</span>
                 <span class="bold_text">CSE-15L</span> Software Tools
               </td></tr>"#,
        );
        let tree = parser().parse(&html).unwrap();
        assert_eq!(
            tree,
            PrereqNode::And {
                items: vec![PrereqNode::Or {
                    items: vec![PrereqNode::course("CSE 12"), PrereqNode::course("CSE 15L")],
                }],
            }
        );
    }

    #[test]
    fn test_rows_without_marker_are_siblings() {
        let html = page(
            r#"<tr><td>1.</td><td><span class="bold_text">MATH 20A</span></td></tr>
               <tr><td>2.</td><td><span class="bold_text">MATH 20B</span></td></tr>"#,
        );
        let tree = parser().parse(&html).unwrap();
        assert_eq!(
            tree,
            PrereqNode::And {
                items: vec![PrereqNode::course("MATH 20A"), PrereqNode::course("MATH 20B")],
            }
        );
    }

    #[test]
    fn test_no_numbered_rows_means_no_prerequisites() {
        let html = page("<tr><td>None</td><td>No prerequisites.</td></tr>");
        let parsed = parser().parse_fragment(&html).unwrap();
        assert!(parsed.tree.is_empty());
        assert_eq!(parsed.raw_text, "");
    }

    #[test]
    fn test_mixed_rows_keep_document_order() {
        let html = page(
            r#"<tr><td>1.</td><td><span class="bold_text">PHYS 2A</span></td></tr>
               <tr><td>Note</td><td><span class="bold_text">PHYS 99</span></td></tr>
               <tr><td>2.</td><td>
                 <span class="bold_text">MATH 18</span>
                 <span class="ertext">or</span>
                 <span class="bold_text">MATH 31AH</span>
               </td></tr>
               <tr><td>3.</td><td>Consent of instructor</td></tr>"#,
        );
        let parsed = parser().parse_fragment(&html).unwrap();
        assert_eq!(
            parsed.tree,
            PrereqNode::And {
                items: vec![
                    PrereqNode::course("PHYS 2A"),
                    PrereqNode::Or {
                        items: vec![
                            PrereqNode::course("MATH 18"),
                            PrereqNode::course("MATH 31AH"),
                        ],
                    },
                ],
            }
        );
        assert_eq!(
            parsed.raw_text,
            "1. PHYS 2A\n2. MATH 18 or MATH 31AH\n3. Consent of instructor"
        );
    }

    #[test]
    fn test_multiple_codes_without_marker_are_implicit_and() {
        let html = page(
            r#"<tr><td>1.</td><td>
                 <span class="bold_text">CHEM 6A</span>
                 <span class="bold_text">CHEM 6B</span>
               </td></tr>"#,
        );
        let tree = parser().parse(&html).unwrap();
        assert_eq!(tree.items().len(), 2);
        assert!(matches!(tree.items()[0], PrereqNode::Course { .. }));
    }

    #[test]
    fn test_empty_fragment_fails() {
        assert!(matches!(parser().parse(""), Err(AppError::Parse(_))));
    }

    struct FixedScanner(Vec<ScannedRow>);

    impl FragmentScanner for FixedScanner {
        fn scan(&self, _fragment: &str) -> Result<Vec<ScannedRow>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parser_independent_of_markup() {
        let rows = vec![
            ScannedRow {
                label: "10.".into(),
                course_codes: vec!["BILD1".into(), "BILD-2".into()],
                has_or_marker: true,
                text: "BILD 1 or BILD 2".into(),
            },
            ScannedRow {
                label: "11.".into(),
                course_codes: Vec::new(),
                has_or_marker: true,
                text: "Department approval".into(),
            },
        ];
        let parser = PrereqParser::new(FixedScanner(rows)).unwrap();
        let tree = parser.parse("ignored").unwrap();
        assert_eq!(
            tree,
            PrereqNode::And {
                items: vec![PrereqNode::Or {
                    items: vec![PrereqNode::course("BILD 1"), PrereqNode::course("BILD 2")],
                }],
            }
        );
    }
}
