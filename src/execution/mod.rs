//! Workflow Execution Module
//!
//! Runs test cases: parallel scheduling across workers, sequential step
//! interpretation within a test case, and response validation.
//!
//! # Architecture
//!
//! - [`engine`]: Bounded worker pool over the configured test cases
//! - [`runner`]: Per-test-case workflow interpreter
//! - [`step`]: Individual step execution logic
//! - [`checks`]: Dotted-path content validation
//! - [`result`]: Stage outcomes and overall status

pub mod checks;
pub mod engine;
pub mod result;
pub mod runner;
pub mod step;

pub use checks::{evaluate_checks, resolve_path, CheckReport};
pub use engine::{Engine, PlannedStep, TestCaseTask};
pub use result::{overall_status, OverallStatus, StageOutcome, WorkflowResult};
pub use runner::{execute_test_workflow, WorkflowRunner};
pub use step::{execute_step, StepContext};
