// src/utils/course_code.rs

//! Course identifier normalization.

use std::sync::LazyLock;

use regex::Regex;

/// `<2-5 letters><1-3 digits><optional trailing letters>`
static COURSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z]{2,5})([0-9]{1,3}[A-Z]*)$").expect("course code pattern is valid")
});

/// Canonicalize a raw course identifier into `"DEPT NUM"` form.
///
/// Hyphens and whitespace are removed before matching. Identifiers that do
/// not have the expected shape are returned unchanged.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();

    match COURSE_CODE.captures(&cleaned) {
        Some(caps) => format!("{} {}", &caps[1], &caps[2]),
        None => raw.to_string(),
    }
}

/// Course identifier as the prerequisite endpoint expects it (`"CSE101"`).
pub fn compact(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}
