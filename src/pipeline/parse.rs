// src/pipeline/parse.rs

//! Offline parsing of a saved prerequisite page.

use std::path::Path;

use crate::error::Result;
use crate::models::PageSelectors;
use crate::services::{ParsedPrereqs, PrereqParser};

/// Parse a prerequisite fragment stored on disk.
pub fn parse_file(path: impl AsRef<Path>, selectors: &PageSelectors) -> Result<ParsedPrereqs> {
    let path = path.as_ref();
    let fragment = std::fs::read_to_string(path)?;
    log::debug!("Parsing {} ({} bytes)", path.display(), fragment.len());

    PrereqParser::from_selectors(selectors)?.parse_fragment(&fragment)
}
