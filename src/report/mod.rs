//! Run Reporting Module
//!
//! - [`summary`]: Ordered per-test-case results and their rendering
//! - [`tee`]: Console + log file output duplication

pub mod summary;
pub mod tee;

pub use summary::{RunSummary, TestCaseReport};
pub use tee::TeeWriter;
