//! Test Case Workflow Interpreter
//!
//! Runs one test case's steps strictly in declaration order and records
//! each outcome under its stage label. A failing step never stops the
//! workflow; later steps still run.

use crate::monitoring::RunEvent;
use crate::workflow::TestCase;

use super::result::WorkflowResult;
use super::step::{execute_step, StepContext};

/// Lifecycle of a single test case run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Complete,
}

/// Interpreter for one test case.
///
/// # Example
///
/// ```rust,no_run
/// # use apirunner::execution::runner::WorkflowRunner;
/// # use apirunner::execution::step::StepContext;
/// # fn demo(test_case: &apirunner::workflow::TestCase, ctx: StepContext<'_>) {
/// let mut runner = WorkflowRunner::new(test_case, ctx);
/// runner.run();
/// println!("{:?}", runner.into_result().overall_status());
/// # }
/// ```
pub struct WorkflowRunner<'a> {
    test_case: &'a TestCase,
    ctx: StepContext<'a>,
    state: RunState,
    result: WorkflowResult,
}

impl<'a> WorkflowRunner<'a> {
    pub fn new(test_case: &'a TestCase, ctx: StepContext<'a>) -> Self {
        Self {
            test_case,
            ctx,
            state: RunState::NotStarted,
            result: WorkflowResult::new(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Executes every step. Calling it again on a completed run does nothing.
    pub fn run(&mut self) -> &WorkflowResult {
        if self.state != RunState::NotStarted {
            return &self.result;
        }

        let test_case_id = self.ctx.test_case_id.to_string();

        self.state = RunState::Running;
        self.ctx.sink.emit(&RunEvent::TestCaseStarted {
            index: self.ctx.test_case_index,
            test_case: test_case_id.clone(),
            steps: self.test_case.workflow.len(),
        });

        for step in &self.test_case.workflow {
            self.ctx.sink.emit(&RunEvent::StageStarted {
                test_case: test_case_id.clone(),
                stage: step.stage.clone(),
                step_type: step.kind().label().to_string(),
            });

            let outcome = execute_step(step, &self.ctx);
            self.result.record(step.stage.clone(), outcome);

            self.ctx.sink.emit(&RunEvent::StageFinished {
                test_case: test_case_id.clone(),
                stage: step.stage.clone(),
                outcome,
            });
        }

        self.state = RunState::Complete;
        self.ctx.sink.emit(&RunEvent::TestCaseFinished {
            index: self.ctx.test_case_index,
            test_case: test_case_id,
            status: self.result.overall_status(),
        });

        &self.result
    }

    pub fn into_result(self) -> WorkflowResult {
        self.result
    }
}

/// Runs a test case's workflow to completion.
pub fn execute_test_workflow(test_case: &TestCase, ctx: StepContext<'_>) -> WorkflowResult {
    let mut runner = WorkflowRunner::new(test_case, ctx);
    runner.run();
    runner.into_result()
}
