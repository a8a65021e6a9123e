//! ApiRunner - Declarative HTTP Test Workflow Runner
//!
//! Executes YAML-defined test cases against a management REST API. Each
//! test case is an ordered workflow of stages: HTTP `GET`/`PUT` requests
//! with status and content validation, or simulated SSH/RDP checks.
//! Test cases run in parallel on a bounded worker pool and report one
//! outcome per stage.
//!
//! # Architecture
//!
//! The library is organized into these modules:
//!
//! - [`workflow`]: Configuration data structures, parsing and validation
//! - [`http`]: The HTTP client capability and URL resolution
//! - [`prefetch`]: Target discovery before scheduling
//! - [`execution`]: Step execution, workflow interpretation and scheduling
//! - [`monitoring`]: Run events, progress logging and timeline
//! - [`report`]: Run summary rendering and output duplication
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use apirunner::execution::Engine;
//! use apirunner::http::ReqwestClient;
//! use apirunner::load_config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("config.yaml")?;
//!     let client = Arc::new(ReqwestClient::new()?);
//!
//!     let mut engine = Engine::new(config, client);
//!     engine.set_target_uuid("virtualservice-4f1c");
//!
//!     let summary = engine.run();
//!     println!("{}", summary.render());
//!     Ok(())
//! }
//! ```

pub mod execution;
pub mod http;
pub mod monitoring;
pub mod prefetch;
pub mod report;
pub mod workflow;

// Re-export commonly used types
pub use execution::engine::Engine;
pub use execution::result::{OverallStatus, StageOutcome, WorkflowResult};
pub use report::RunSummary;
pub use workflow::model::{Config, Step, TestCase};
pub use workflow::parser::load_config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ApiRunner";
