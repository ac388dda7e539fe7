// src/lib.rs

//! Schedule-of-classes catalog crawler library.
//!
//! Harvests every department's courses for one term, parses each course's
//! prerequisite page into an AND/OR tree, and persists the catalog.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
