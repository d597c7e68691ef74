//! # Dongjeop Common Library
//!
//! Shared code for the accessibility review service:
//! - Labeled photo records and their defaults
//! - Accessibility scoring rubric and grades
//! - Relabel heuristic
//! - Filtering/pagination over the in-memory dataset
//! - Aggregate statistics and recommendations
//! - JSONL record store
//! - Configuration loading

pub mod config;
pub mod error;
pub mod query;
pub mod recommend;
pub mod record;
pub mod relabel;
pub mod scoring;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use record::{AccessibilityRecord, ChairInfo, ChairType, WidthClass};
pub use scoring::{score, Grade, ScoreResult};
pub use store::RecordStore;
