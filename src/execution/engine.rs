//! Test Case Execution Engine
//!
//! The engine that schedules test cases over a bounded pool of workers:
//! - Up to `max_parallel` test cases run at once, the rest queue
//! - Each worker runs one whole test case workflow
//! - Results are collected by original position, not completion order
//! - A fault inside one test case is captured as that test case's failure

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};

use crate::http::{resolve_url, HttpClient};
use crate::monitoring::{EventSink, LogSink, RunEvent};
use crate::report::{RunSummary, TestCaseReport};
use crate::workflow::{Config, StepKind, TestCase};

use super::runner::execute_test_workflow;
use super::step::StepContext;

/// One unit of work handed to a worker.
#[derive(Clone, Copy)]
pub struct TestCaseTask<'a> {
    /// Position of the test case in the configuration
    pub index: usize,
    pub test_case: &'a TestCase,
    pub config: &'a Config,
    pub target_uuid: Option<&'a str>,
}

impl TestCaseTask<'_> {
    /// Runs the test case, capturing panics as a faulted report.
    pub fn execute(&self, client: &dyn HttpClient, sink: &dyn EventSink) -> TestCaseReport {
        let settings = &self.config.settings;
        let ctx = StepContext {
            test_case_index: self.index,
            test_case_id: &self.test_case.id,
            mock_host: self.test_case.mock_host(),
            api: &self.config.api,
            client,
            target_uuid: self.target_uuid,
            sink,
            mock_delay: Duration::from_millis(settings.mock_delay_ms),
            report_content_pass: settings.report_content_pass,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| {
            execute_test_workflow(self.test_case, ctx)
        })) {
            Ok(result) => TestCaseReport::completed(self.test_case.id.clone(), result),
            Err(payload) => {
                TestCaseReport::faulted(self.test_case.id.clone(), panic_message(&payload))
            }
        }
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A request the run would send, for dry runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub test_case: String,
    pub stage: String,
    pub step_type: String,
    /// Resolved URL for HTTP steps
    pub url: Option<String>,
}

/// Test case execution engine.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use apirunner::execution::Engine;
/// use apirunner::http::ReqwestClient;
/// use apirunner::load_config;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = load_config("config.yaml")?;
///     let client = Arc::new(ReqwestClient::new()?);
///
///     let mut engine = Engine::new(config, client);
///     engine.set_target_uuid("virtualservice-4f1c");
///     engine.set_max_parallel(4);
///
///     let summary = engine.run();
///     println!("{}", summary.render());
///     Ok(())
/// }
/// ```
pub struct Engine {
    config: Config,
    client: Arc<dyn HttpClient>,
    sink: Arc<dyn EventSink>,
    max_parallel: usize,
    target_uuid: Option<String>,
}

impl Engine {
    /// Creates an engine using the configured worker count and a [`LogSink`].
    pub fn new(config: Config, client: Arc<dyn HttpClient>) -> Self {
        let max_parallel = config.settings.parallel_execution_count;
        Self {
            config,
            client,
            sink: Arc::new(LogSink),
            max_parallel,
            target_uuid: None,
        }
    }

    /// Sets the maximum number of concurrently running test cases.
    pub fn set_max_parallel(&mut self, max: usize) {
        self.max_parallel = max;
    }

    /// Sets the identifier substituted for `{uuid}` in endpoints.
    pub fn set_target_uuid(&mut self, uuid: impl Into<String>) {
        self.target_uuid = Some(uuid.into());
    }

    /// Replaces the destination of run events.
    pub fn set_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sink = sink;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of workers actually used for a run.
    fn worker_count(&self) -> usize {
        if self.max_parallel == 0 {
            warn!("Parallel execution count of 0 requested, using 1 worker");
        }
        self.max_parallel
            .max(1)
            .min(self.config.test_cases.len().max(1))
    }

    fn tasks(&self) -> Vec<TestCaseTask<'_>> {
        self.config
            .test_cases
            .iter()
            .enumerate()
            .map(|(index, test_case)| TestCaseTask {
                index,
                test_case,
                config: &self.config,
                target_uuid: self.target_uuid.as_deref(),
            })
            .collect()
    }

    /// Runs every test case and returns results in configuration order.
    ///
    /// The run always completes: step failures are recorded as outcomes
    /// and a panicking test case becomes a faulted `FAILURE` report.
    pub fn run(&self) -> RunSummary {
        let started_at = Utc::now();
        let workers = self.worker_count();
        let total = self.config.test_cases.len();

        info!(
            "Starting execution ({} test cases, max parallel: {})",
            total, workers
        );
        self.sink.emit(&RunEvent::RunStarted {
            test_cases: total,
            workers,
        });

        let mut slots: Vec<Option<TestCaseReport>> = (0..total).map(|_| None).collect();
        let client: &dyn HttpClient = self.client.as_ref();
        let sink: &dyn EventSink = self.sink.as_ref();

        thread::scope(|scope| {
            let (tx, rx) = channel::<(usize, TestCaseReport)>();
            let mut pending = self.tasks().into_iter();
            let mut running_count = 0;

            loop {
                // Fill free worker slots
                while running_count < workers {
                    let Some(task) = pending.next() else {
                        break;
                    };

                    let tx = tx.clone();
                    scope.spawn(move || {
                        let report = task.execute(client, sink);
                        if let Err(e) = tx.send((task.index, report)) {
                            error!("Failed to send completion signal: {}", e);
                        }
                    });
                    running_count += 1;
                }

                if running_count == 0 {
                    break;
                }

                match rx.recv() {
                    Ok((index, report)) => {
                        running_count -= 1;
                        if let Some(reason) = &report.fault {
                            sink.emit(&RunEvent::TestCaseFaulted {
                                index,
                                test_case: report.test_case_id.clone(),
                                reason: reason.clone(),
                            });
                        }
                        slots[index] = Some(report);
                    }
                    Err(e) => {
                        error!("Failed to receive test case completion: {}", e);
                        break;
                    }
                }
            }
        });

        let test_cases: Vec<TestCaseReport> = slots
            .into_iter()
            .zip(&self.config.test_cases)
            .map(|(slot, test_case)| {
                slot.unwrap_or_else(|| {
                    TestCaseReport::faulted(test_case.id.clone(), "worker exited without reporting")
                })
            })
            .collect();

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            target_uuid: self.target_uuid.clone(),
            test_cases,
        };

        self.sink.emit(&RunEvent::RunFinished {
            passed: summary.passed(),
            failed: summary.failed(),
        });

        summary
    }

    /// Lists every step with its resolved URL without sending anything.
    pub fn plan(&self) -> Vec<PlannedStep> {
        self.config
            .test_cases
            .iter()
            .flat_map(|test_case| {
                test_case.workflow.iter().map(move |step| {
                    let kind = step.kind();
                    let url = match kind {
                        StepKind::Get | StepKind::Put => Some(resolve_url(
                            &self.config.api.base_url,
                            &step.endpoint,
                            self.target_uuid.as_deref(),
                        )),
                        _ => None,
                    };
                    PlannedStep {
                        test_case: test_case.id.clone(),
                        stage: step.stage.clone(),
                        step_type: kind.label().to_string(),
                        url,
                    }
                })
            })
            .collect()
    }
}
