//! Configuration Validation
//!
//! Checks a parsed configuration before any test case is scheduled:
//! - At least one test case exists
//! - The worker count is usable
//! - Per-step hazards (duplicate stage labels, unknown types) are reported

use std::collections::HashSet;

use log::{debug, info, warn};
use thiserror::Error;

use crate::http::is_absolute;

use super::model::{Config, StepKind, TestCase};

/// Fatal configuration problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'test_cases' section is empty")]
    NoTestCases,

    #[error("settings.parallel_execution_count must be at least 1")]
    ZeroParallelism,
}

/// Logs warnings for a single test case. Never fails.
fn inspect_test_case(test_case: &TestCase, base_url: &str) {
    if test_case.workflow.is_empty() {
        warn!("Test case '{}' has an empty workflow", test_case.id);
    }

    let mut seen_stages: HashSet<&str> = HashSet::new();

    for step in &test_case.workflow {
        if !seen_stages.insert(step.stage.as_str()) {
            warn!(
                "Test case '{}': stage '{}' repeats, its later result overwrites the earlier one",
                test_case.id, step.stage
            );
        }

        match step.kind() {
            StepKind::Get | StepKind::Put => {
                if !is_absolute(&step.endpoint) && base_url.trim().is_empty() {
                    warn!(
                        "Test case '{}': stage '{}' has relative endpoint '{}' but no base_url",
                        test_case.id, step.stage, step.endpoint
                    );
                }
                if step.kind() == StepKind::Put && step.payload.is_none() {
                    warn!(
                        "Test case '{}': PUT stage '{}' has no payload",
                        test_case.id, step.stage
                    );
                }
            }
            StepKind::Unknown(name) => {
                warn!(
                    "Test case '{}': stage '{}' has unknown type '{}' and will be skipped",
                    test_case.id, step.stage, name
                );
            }
            StepKind::MockSsh | StepKind::MockRdp => {
                debug!(
                    "Test case '{}': stage '{}' is a mock connection check",
                    test_case.id, step.stage
                );
            }
        }
    }
}

/// Validates the entire configuration.
///
/// Returns the first fatal problem found. Non-fatal hazards are
/// logged as warnings and do not stop the run.
pub fn validate_config(config: &Config) -> Result<(), ValidationError> {
    info!(
        "Validating configuration with {} test cases",
        config.test_cases.len()
    );

    if config.test_cases.is_empty() {
        return Err(ValidationError::NoTestCases);
    }

    if config.settings.parallel_execution_count == 0 {
        return Err(ValidationError::ZeroParallelism);
    }

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for test_case in &config.test_cases {
        if !seen_ids.insert(test_case.id.as_str()) {
            warn!("Duplicate test case id: '{}'", test_case.id);
        }
        inspect_test_case(test_case, &config.api.base_url);
    }

    info!("Configuration validation passed");
    Ok(())
}
