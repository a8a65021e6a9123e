//! Run Events
//!
//! Structured progress events emitted by the execution core. Callers
//! decide where they go by supplying an [`EventSink`]; the default
//! [`LogSink`] renders them through the `log` facade.

use std::sync::Arc;

use log::{log, Level};
use serde_json::Value;

use crate::execution::result::{OverallStatus, StageOutcome};
use crate::http::Method;

/// Mock connection protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockProtocol {
    Ssh,
    Rdp,
}

impl MockProtocol {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ssh => "MOCK_SSH",
            Self::Rdp => "MOCK_RDP",
        }
    }
}

/// A single progress event. Every per-test-case event carries the test
/// case id so output from concurrent workers stays attributable.
/// Test case lifecycle events also carry the test case's position in the
/// configuration, since ids need not be unique.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        test_cases: usize,
        workers: usize,
    },
    TestCaseStarted {
        index: usize,
        test_case: String,
        steps: usize,
    },
    StageStarted {
        test_case: String,
        stage: String,
        step_type: String,
    },
    MockConnection {
        test_case: String,
        protocol: MockProtocol,
        host: String,
    },
    RequestSent {
        test_case: String,
        method: Method,
        url: String,
    },
    RequestFailed {
        test_case: String,
        stage: String,
        reason: String,
    },
    StatusChecked {
        test_case: String,
        actual: u16,
        expected: u16,
    },
    BodyUnparseable {
        test_case: String,
        stage: String,
        reason: String,
    },
    ValueChecked {
        test_case: String,
        path: String,
        expected: Value,
        actual: Option<Value>,
        passed: bool,
    },
    StageSkipped {
        test_case: String,
        stage: String,
        step_type: String,
    },
    StageFinished {
        test_case: String,
        stage: String,
        outcome: StageOutcome,
    },
    TestCaseFinished {
        index: usize,
        test_case: String,
        status: OverallStatus,
    },
    TestCaseFaulted {
        index: usize,
        test_case: String,
        reason: String,
    },
    RunFinished {
        passed: usize,
        failed: usize,
    },
}

/// Destination for run events. Shared by all workers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&self, event: &RunEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, event: &RunEvent) {
        (**self).emit(event);
    }
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &RunEvent) {}
}

/// Renders events as human-readable progress lines.
pub struct LogSink;

fn display_value(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<not found>".to_string(),
    }
}

impl LogSink {
    /// Log level and progress line for an event.
    pub fn render(event: &RunEvent) -> (Level, String) {
        match event {
            RunEvent::RunStarted { test_cases, workers } => (
                Level::Info,
                format!(
                    "Running {} test cases with {} parallel workers",
                    test_cases, workers
                ),
            ),
            RunEvent::TestCaseStarted { test_case, steps, .. } => (
                Level::Info,
                format!("[{}] Starting Test Case ({} stages)", test_case, steps),
            ),
            RunEvent::StageStarted { test_case, stage, step_type } => (
                Level::Info,
                format!("[{}] Stage: {} ({})", test_case, stage, step_type),
            ),
            RunEvent::MockConnection { test_case, protocol, host } => {
                let action = match protocol {
                    MockProtocol::Ssh => "Connecting to host",
                    MockProtocol::Rdp => "Validating remote connection for host",
                };
                (
                    Level::Info,
                    format!("[{}]     [{}] {}: {}", test_case, protocol.label(), action, host),
                )
            }
            RunEvent::RequestSent { test_case, method, url } => (
                Level::Info,
                format!("[{}]   -> API Call: {} {}", test_case, method, url),
            ),
            RunEvent::RequestFailed { test_case, stage, reason } => (
                Level::Error,
                format!(
                    "[{}]   [FAIL] HTTP request failed for stage '{}': {}",
                    test_case, stage, reason
                ),
            ),
            RunEvent::StatusChecked { test_case, actual, expected } if actual == expected => (
                Level::Info,
                format!(
                    "[{}]   [PASS] Status Code: {} matches expected {}",
                    test_case, actual, expected
                ),
            ),
            RunEvent::StatusChecked { test_case, actual, expected } => (
                Level::Warn,
                format!(
                    "[{}]   [FAIL] Status Code: {} does not match expected {}",
                    test_case, actual, expected
                ),
            ),
            RunEvent::BodyUnparseable { test_case, stage, reason } => (
                Level::Warn,
                format!(
                    "[{}]   [FAIL] Could not parse JSON response for validation in stage '{}': {}",
                    test_case, stage, reason
                ),
            ),
            RunEvent::ValueChecked {
                test_case,
                path,
                actual,
                passed: true,
                ..
            } => (
                Level::Info,
                format!(
                    "[{}]     [PASS] Validation: Found '{}': {}",
                    test_case,
                    path,
                    display_value(actual)
                ),
            ),
            RunEvent::ValueChecked {
                test_case,
                path,
                expected,
                actual,
                ..
            } => (
                Level::Warn,
                format!(
                    "[{}]     [FAIL] Validation: For '{}' expected '{}', got '{}'",
                    test_case,
                    path,
                    display_value(&Some(expected.clone())),
                    display_value(actual)
                ),
            ),
            RunEvent::StageSkipped { test_case, stage, step_type } => (
                Level::Warn,
                format!(
                    "[{}]   Unknown workflow step type '{}' for stage '{}', skipping",
                    test_case, step_type, stage
                ),
            ),
            RunEvent::StageFinished { test_case, stage, outcome } => (
                Level::Debug,
                format!("[{}] Stage '{}' -> {}", test_case, stage, outcome),
            ),
            RunEvent::TestCaseFinished { test_case, status, .. } => (
                Level::Info,
                format!("[{}] Finished Test Case: {}", test_case, status),
            ),
            RunEvent::TestCaseFaulted { test_case, reason, .. } => (
                Level::Error,
                format!("[{}] Test case aborted by internal fault: {}", test_case, reason),
            ),
            RunEvent::RunFinished { passed, failed } => (
                Level::Info,
                format!("Run finished: {} succeeded, {} failed", passed, failed),
            ),
        }
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: &RunEvent) {
        let (level, line) = Self::render(event);
        log!(level, "{}", line);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::{EventSink, RunEvent};

    /// Stores every event for later inspection.
    #[derive(Default)]
    pub struct CollectingSink {
        events: Mutex<Vec<RunEvent>>,
    }

    impl CollectingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<RunEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        pub fn count_where(&self, predicate: impl Fn(&RunEvent) -> bool) -> usize {
            self.events().iter().filter(|e| predicate(e)).count()
        }
    }

    impl EventSink for CollectingSink {
        fn emit(&self, event: &RunEvent) {
            if let Ok(mut events) = self.events.lock() {
                events.push(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CollectingSink;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Some(json!("web"))), "web");
        assert_eq!(display_value(&Some(json!(true))), "true");
        assert_eq!(display_value(&None), "<not found>");
    }

    #[test]
    fn test_pair_sink_forwards_to_both() {
        let sink = (CollectingSink::new(), CollectingSink::new());
        sink.emit(&RunEvent::RunFinished { passed: 1, failed: 0 });

        assert_eq!(sink.0.events().len(), 1);
        assert_eq!(sink.1.events().len(), 1);
    }

    #[test]
    fn test_shared_sink_stays_observable() {
        let collector = Arc::new(CollectingSink::new());
        let sink = (NullSink, collector.clone());
        sink.emit(&RunEvent::RunStarted { test_cases: 2, workers: 1 });

        assert_eq!(collector.events().len(), 1);
    }

    fn rendered(event: RunEvent) -> (Level, String) {
        LogSink::render(&event)
    }

    #[test]
    fn test_log_sink_renders_every_event() {
        let cases = vec![
            (
                RunEvent::RunStarted { test_cases: 3, workers: 2 },
                Level::Info,
                "Running 3 test cases with 2 parallel workers",
            ),
            (
                RunEvent::TestCaseStarted { index: 0, test_case: "t".into(), steps: 4 },
                Level::Info,
                "[t] Starting Test Case (4 stages)",
            ),
            (
                RunEvent::StageStarted {
                    test_case: "t".into(),
                    stage: "fetch".into(),
                    step_type: "GET".into(),
                },
                Level::Info,
                "[t] Stage: fetch (GET)",
            ),
            (
                RunEvent::MockConnection {
                    test_case: "t".into(),
                    protocol: MockProtocol::Ssh,
                    host: "web-vs".into(),
                },
                Level::Info,
                "[MOCK_SSH] Connecting to host: web-vs",
            ),
            (
                RunEvent::MockConnection {
                    test_case: "t".into(),
                    protocol: MockProtocol::Rdp,
                    host: "web-vs".into(),
                },
                Level::Info,
                "[MOCK_RDP] Validating remote connection for host: web-vs",
            ),
            (
                RunEvent::RequestSent {
                    test_case: "t".into(),
                    method: Method::Put,
                    url: "http://ctl/a".into(),
                },
                Level::Info,
                "-> API Call: PUT http://ctl/a",
            ),
            (
                RunEvent::RequestFailed {
                    test_case: "t".into(),
                    stage: "fetch".into(),
                    reason: "refused".into(),
                },
                Level::Error,
                "HTTP request failed for stage 'fetch': refused",
            ),
            (
                RunEvent::StatusChecked { test_case: "t".into(), actual: 200, expected: 200 },
                Level::Info,
                "[PASS] Status Code: 200 matches expected 200",
            ),
            (
                RunEvent::StatusChecked { test_case: "t".into(), actual: 201, expected: 200 },
                Level::Warn,
                "[FAIL] Status Code: 201 does not match expected 200",
            ),
            (
                RunEvent::BodyUnparseable {
                    test_case: "t".into(),
                    stage: "fetch".into(),
                    reason: "eof".into(),
                },
                Level::Warn,
                "Could not parse JSON response for validation in stage 'fetch': eof",
            ),
            (
                RunEvent::ValueChecked {
                    test_case: "t".into(),
                    path: "a.b".into(),
                    expected: json!("on"),
                    actual: Some(json!("on")),
                    passed: true,
                },
                Level::Info,
                "[PASS] Validation: Found 'a.b': on",
            ),
            (
                RunEvent::ValueChecked {
                    test_case: "t".into(),
                    path: "a.b".into(),
                    expected: json!(1),
                    actual: None,
                    passed: false,
                },
                Level::Warn,
                "[FAIL] Validation: For 'a.b' expected '1', got '<not found>'",
            ),
            (
                RunEvent::StageSkipped {
                    test_case: "t".into(),
                    stage: "telnet".into(),
                    step_type: "TELNET".into(),
                },
                Level::Warn,
                "Unknown workflow step type 'TELNET' for stage 'telnet', skipping",
            ),
            (
                RunEvent::StageFinished {
                    test_case: "t".into(),
                    stage: "fetch".into(),
                    outcome: StageOutcome::ContentFail,
                },
                Level::Debug,
                "[t] Stage 'fetch' -> CONTENT_FAIL",
            ),
            (
                RunEvent::TestCaseFinished {
                    index: 0,
                    test_case: "t".into(),
                    status: OverallStatus::Failure,
                },
                Level::Info,
                "[t] Finished Test Case: FAILURE",
            ),
            (
                RunEvent::TestCaseFaulted {
                    index: 0,
                    test_case: "t".into(),
                    reason: "boom".into(),
                },
                Level::Error,
                "[t] Test case aborted by internal fault: boom",
            ),
            (
                RunEvent::RunFinished { passed: 2, failed: 1 },
                Level::Info,
                "Run finished: 2 succeeded, 1 failed",
            ),
        ];

        for (event, level, fragment) in cases {
            let (actual_level, line) = rendered(event.clone());
            assert_eq!(actual_level, level, "level of {:?}", event);
            assert!(line.contains(fragment), "{:?} rendered as {:?}", event, line);
            LogSink.emit(&event);
        }
    }

    #[test]
    fn test_per_test_case_lines_carry_id_prefix() {
        let (_, line) = rendered(RunEvent::RequestSent {
            test_case: "TC-7".into(),
            method: Method::Get,
            url: "http://ctl".into(),
        });
        assert!(line.starts_with("[TC-7]"));
    }

    #[test]
    fn test_mock_protocol_labels() {
        assert_eq!(MockProtocol::Ssh.label(), "MOCK_SSH");
        assert_eq!(MockProtocol::Rdp.label(), "MOCK_RDP");
    }
}
