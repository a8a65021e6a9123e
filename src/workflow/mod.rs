//! Run Configuration Module
//!
//! Provides data structures and utilities for defining, parsing, and
//! validating test case workflows.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (Config, TestCase, Step)
//! - [`parser`]: YAML parsing and loading
//! - [`validator`]: Validation rules and hazard warnings

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{ApiConfig, Config, Settings, Step, StepKind, TestCase};
pub use parser::{load_config, parse_config, ConfigError};
pub use validator::{validate_config, ValidationError};
