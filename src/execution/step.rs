//! Individual Step Execution
//!
//! Handles the execution of a single workflow step:
//! - Mock connection checks (MOCK_SSH / MOCK_RDP)
//! - HTTP requests (GET / PUT) with status and content validation
//! - Skipping of unknown step types

use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::http::{resolve_url, HttpClient, HttpResponse, Method};
use crate::monitoring::{EventSink, MockProtocol, RunEvent};
use crate::workflow::{ApiConfig, Step, StepKind};

use super::checks::evaluate_checks;
use super::result::StageOutcome;

/// Everything a step needs besides the step itself.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Position of the test case in the configuration
    pub test_case_index: usize,
    pub test_case_id: &'a str,
    /// Host name displayed by mock steps
    pub mock_host: &'a str,
    pub api: &'a ApiConfig,
    pub client: &'a dyn HttpClient,
    pub target_uuid: Option<&'a str>,
    pub sink: &'a dyn EventSink,
    pub mock_delay: Duration,
    /// Report CONTENT_PASS when every content check matched
    pub report_content_pass: bool,
}

impl StepContext<'_> {
    fn emit(&self, event: RunEvent) {
        self.sink.emit(&event);
    }
}

/// Executes a single workflow step and returns its outcome.
///
/// Failures never escape as errors: transport problems, unexpected
/// status codes and unparseable bodies are all reported as `FAIL`,
/// content mismatches as `CONTENT_FAIL`.
pub fn execute_step(step: &Step, ctx: &StepContext<'_>) -> StageOutcome {
    match step.kind() {
        StepKind::MockSsh => mock_connection(MockProtocol::Ssh, ctx),
        StepKind::MockRdp => mock_connection(MockProtocol::Rdp, ctx),
        StepKind::Get => execute_request(step, Method::Get, ctx),
        StepKind::Put => execute_request(step, Method::Put, ctx),
        StepKind::Unknown(name) => {
            ctx.emit(RunEvent::StageSkipped {
                test_case: ctx.test_case_id.to_string(),
                stage: step.stage.clone(),
                step_type: name,
            });
            StageOutcome::Skipped
        }
    }
}

/// Simulates a remote connection check. Never touches the network.
fn mock_connection(protocol: MockProtocol, ctx: &StepContext<'_>) -> StageOutcome {
    ctx.emit(RunEvent::MockConnection {
        test_case: ctx.test_case_id.to_string(),
        protocol,
        host: ctx.mock_host.to_string(),
    });

    if !ctx.mock_delay.is_zero() {
        thread::sleep(ctx.mock_delay);
    }

    debug!(
        "[{}] {} connection to {} succeeded (mock)",
        ctx.test_case_id,
        protocol.label(),
        ctx.mock_host
    );
    StageOutcome::MockSuccess
}

/// Sends the step's request and classifies the response.
fn execute_request(step: &Step, method: Method, ctx: &StepContext<'_>) -> StageOutcome {
    let url = resolve_url(&ctx.api.base_url, &step.endpoint, ctx.target_uuid);

    ctx.emit(RunEvent::RequestSent {
        test_case: ctx.test_case_id.to_string(),
        method,
        url: url.clone(),
    });

    let payload = match method {
        Method::Put => step.payload.as_ref(),
        Method::Get => None,
    };

    let response = match ctx.client.request(method, &url, &ctx.api.headers, payload) {
        Ok(response) => response,
        Err(e) => {
            ctx.emit(RunEvent::RequestFailed {
                test_case: ctx.test_case_id.to_string(),
                stage: step.stage.clone(),
                reason: e.to_string(),
            });
            return StageOutcome::Fail;
        }
    };

    ctx.emit(RunEvent::StatusChecked {
        test_case: ctx.test_case_id.to_string(),
        actual: response.status,
        expected: step.expected_status,
    });

    if response.status != step.expected_status {
        return StageOutcome::Fail;
    }

    match step.checks() {
        Some(checks) => validate_content(step, checks, &response, ctx),
        None => StageOutcome::Pass,
    }
}

/// Runs the step's content checks against a response body.
fn validate_content(
    step: &Step,
    checks: &IndexMap<String, Value>,
    response: &HttpResponse,
    ctx: &StepContext<'_>,
) -> StageOutcome {
    let body = match response.json() {
        Ok(body) => body,
        Err(e) => {
            ctx.emit(RunEvent::BodyUnparseable {
                test_case: ctx.test_case_id.to_string(),
                stage: step.stage.clone(),
                reason: e.to_string(),
            });
            return StageOutcome::Fail;
        }
    };

    let report = evaluate_checks(&body, checks);

    for check in &report.results {
        ctx.emit(RunEvent::ValueChecked {
            test_case: ctx.test_case_id.to_string(),
            path: check.path.clone(),
            expected: check.expected.clone(),
            actual: check.actual.clone(),
            passed: check.passed,
        });
    }

    if !report.passed() {
        StageOutcome::ContentFail
    } else if ctx.report_content_pass {
        StageOutcome::ContentPass
    } else {
        StageOutcome::Pass
    }
}
