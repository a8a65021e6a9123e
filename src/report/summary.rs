//! Run Summary
//!
//! The ordered per-test-case results of a run, rendered for the console
//! and optionally written as JSON.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::execution::result::{OverallStatus, WorkflowResult};

/// Result of one test case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestCaseReport {
    pub test_case_id: String,
    pub result: WorkflowResult,
    pub status: OverallStatus,

    /// Set when the test case was aborted by an internal fault
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl TestCaseReport {
    /// Report for a workflow that ran to completion.
    pub fn completed(test_case_id: impl Into<String>, result: WorkflowResult) -> Self {
        let status = result.overall_status();
        Self {
            test_case_id: test_case_id.into(),
            result,
            status,
            fault: None,
        }
    }

    /// Report for a workflow aborted by a fault. Always a failure.
    pub fn faulted(test_case_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            test_case_id: test_case_id.into(),
            result: WorkflowResult::new(),
            status: OverallStatus::Failure,
            fault: Some(reason.into()),
        }
    }
}

/// Ordered results of every configured test case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_uuid: Option<String>,

    /// Positionally aligned with the configured test cases
    pub test_cases: Vec<TestCaseReport>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.test_cases
            .iter()
            .filter(|r| r.status == OverallStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.test_cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Plain-text summary, one block per test case.
    pub fn render(&self) -> String {
        let mut output = String::new();

        for report in &self.test_cases {
            output.push_str(&format!(
                "Test Case ID: {} | Status: {}\n",
                report.test_case_id, report.status
            ));
            if let Some(fault) = &report.fault {
                output.push_str(&format!("  ! aborted: {}\n", fault));
            }
            for (stage, outcome) in report.result.iter() {
                output.push_str(&format!("  - {}: {}\n", stage, outcome));
            }
        }

        let seconds = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
        output.push_str(&format!(
            "\n{} test cases: {} succeeded, {} failed ({:.2}s)\n",
            self.test_cases.len(),
            self.passed(),
            self.failed(),
            seconds
        ));
        output
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        info!("Run report written to {}", path.as_ref().display());
        Ok(())
    }
}
