//! Search-form parameters for the schedule-of-classes search.
//!
//! Only the department tab is modelled; the other tabs of the form are left
//! at the site's defaults by omission.

/// Tab of the search form a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTab {
    Subject,
    Department,
    Course,
    Sections,
    Instructor,
}

impl SearchTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchTab::Subject => "tabs-sub",
            SearchTab::Department => "tabs-dept",
            SearchTab::Course => "tabs-crs",
            SearchTab::Sections => "tabs-sec",
            SearchTab::Instructor => "tabs-ins",
        }
    }
}

/// Course-level filters of the department tab. There is no option 6.
const DIVISION_OPTIONS: [u8; 12] = [1, 11, 12, 2, 4, 5, 3, 7, 8, 13, 10, 9];

/// Meeting days; `R` is Thursday and there is no Sunday.
const DAYS: [&str; 6] = ["M", "T", "W", "R", "F", "S"];

/// A search request scoped to one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub term: String,
    pub tab: SearchTab,
    pub departments: Vec<String>,
    pub hide_full_sections: bool,
}

impl SearchRequest {
    pub fn new(term: impl Into<String>, tab: SearchTab) -> Self {
        Self {
            term: term.into(),
            tab,
            departments: Vec::new(),
            hide_full_sections: false,
        }
    }

    /// Department-tab request for a single department.
    pub fn for_department(term: impl Into<String>, code: &str) -> Self {
        let mut request = Self::new(term, SearchTab::Department);
        request.add_department(code);
        request
    }

    /// Add a department; the site expects it as both a department and a subject.
    pub fn add_department(&mut self, code: &str) {
        self.departments.push(code.trim().to_string());
    }

    /// Encode as form fields, in the order the site's own form posts them.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: &str| form.push((key.to_string(), value.to_string()));

        push("selectedTerm", self.term.as_str());
        push("xsoc_term", "");
        push("loggedIn", "false");
        push("tabNum", self.tab.as_str());

        for code in &self.departments {
            push("selectedSubjects", code.as_str());
        }
        push("_selectedSubjects", "1");

        for code in &self.departments {
            push("selectedDepartments", code.as_str());
        }
        push("_selectedDepartments", "1");

        for option in DIVISION_OPTIONS {
            push(format!("schedOptionDept{option}").as_str(), "true");
            push(format!("_schedOptionDept{option}").as_str(), "on");
        }
        for day in DAYS {
            push("schDayDept", day);
            push("_schDayDept", "on");
        }
        push("schStartTimeDept", "12:00");
        push("schStartAmPmDept", "0");
        push("schEndTimeDept", "12:00");
        push("schEndAmPmDept", "0");

        push(
            "hideFullSec",
            if self.hide_full_sections { "true" } else { "false" },
        );
        push("_hideFullSec", "on");
        push("showPopup", "false");
        push("_showPopup", "on");

        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(form: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        form.iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn test_department_request_form() {
        let form = SearchRequest::for_department("SP26", " CSE ").to_form();
        assert_eq!(values(&form, "selectedTerm"), vec!["SP26"]);
        assert_eq!(values(&form, "tabNum"), vec!["tabs-dept"]);
        assert_eq!(values(&form, "selectedDepartments"), vec!["CSE"]);
        assert_eq!(values(&form, "selectedSubjects"), vec!["CSE"]);
        assert_eq!(values(&form, "loggedIn"), vec!["false"]);
        assert_eq!(values(&form, "schDayDept").len(), 6);
    }

    #[test]
    fn test_division_options_skip_six() {
        let form = SearchRequest::for_department("SP26", "MATH").to_form();
        assert!(values(&form, "schedOptionDept6").is_empty());
        assert_eq!(values(&form, "schedOptionDept13"), vec!["true"]);
        assert_eq!(values(&form, "_schedOptionDept13"), vec!["on"]);
    }

    #[test]
    fn test_multiple_departments() {
        let mut request = SearchRequest::new("FA25", SearchTab::Department);
        request.add_department("CSE");
        request.add_department("ECE");
        let form = request.to_form();
        assert_eq!(values(&form, "selectedDepartments"), vec!["CSE", "ECE"]);
    }
}
