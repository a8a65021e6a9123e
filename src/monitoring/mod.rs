//! Run Monitoring Module
//!
//! Progress reporting for workflow runs.
//!
//! # Components
//!
//! - [`events`]: Structured run events and the [`EventSink`] trait
//! - [`timeline`]: Per-test-case start/finish timing

pub mod events;
pub mod timeline;

pub use events::{EventSink, LogSink, MockProtocol, NullSink, RunEvent};
pub use timeline::{ExecutionTimeline, MarkKind, TimelineSink};
