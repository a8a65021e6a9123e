//! Stage Outcomes and Workflow Results
//!
//! Every executed step produces exactly one [`StageOutcome`], recorded in
//! the test case's [`WorkflowResult`] under the step's stage label.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Terminal status of one executed step.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageOutcome {
    Pass,
    ContentPass,
    MockSuccess,
    Fail,
    ContentFail,
    Skipped,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::ContentPass => "CONTENT_PASS",
            Self::MockSuccess => "MOCK_SUCCESS",
            Self::Fail => "FAIL",
            Self::ContentFail => "CONTENT_FAIL",
            Self::Skipped => "SKIPPED",
        }
    }

    /// True for outcomes that do not fail the test case.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Pass | Self::ContentPass | Self::MockSuccess | Self::Skipped
        )
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict of a test case.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Success,
    Failure,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping of stage label to outcome.
///
/// Insertion order follows step execution order. Recording a label a
/// second time replaces its outcome but keeps its original position.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct WorkflowResult {
    stages: IndexMap<String, StageOutcome>,
}

impl WorkflowResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a stage (last write wins).
    pub fn record(&mut self, stage: impl Into<String>, outcome: StageOutcome) {
        self.stages.insert(stage.into(), outcome);
    }

    pub fn get(&self, stage: &str) -> Option<StageOutcome> {
        self.stages.get(stage).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StageOutcome)> {
        self.stages.iter().map(|(stage, outcome)| (stage.as_str(), *outcome))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Overall status derived from the recorded outcomes.
    pub fn overall_status(&self) -> OverallStatus {
        overall_status(self)
    }
}

impl<S: Into<String>> FromIterator<(S, StageOutcome)> for WorkflowResult {
    fn from_iter<I: IntoIterator<Item = (S, StageOutcome)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (stage, outcome) in iter {
            result.record(stage, outcome);
        }
        result
    }
}

/// SUCCESS iff every recorded outcome is non-failing. An empty result is SUCCESS.
pub fn overall_status(result: &WorkflowResult) -> OverallStatus {
    if result.iter().all(|(_, outcome)| outcome.is_success()) {
        OverallStatus::Success
    } else {
        OverallStatus::Failure
    }
}
