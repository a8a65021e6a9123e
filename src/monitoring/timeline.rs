//! Test Case Timeline
//!
//! Records when each test case starts and finishes so the run can end
//! with a timing chart showing how workers overlapped.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::events::{EventSink, RunEvent};
use crate::execution::result::OverallStatus;

/// Width of the chart bars in characters.
const CHART_WIDTH: f64 = 50.0;

/// Width of the test case label column.
const LABEL_WIDTH: usize = 14;

/// Kind of timeline mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Started,
    Succeeded,
    Failed,
}

/// A single mark on the timeline.
#[derive(Debug, Clone)]
pub struct TimelineMark {
    /// Position of the test case in the configuration
    pub index: usize,
    pub test_case: String,
    pub kind: MarkKind,
    pub at: Instant,
}

/// A finished test case's interval on the timeline.
#[derive(Debug, Clone)]
struct Span {
    index: usize,
    test_case: String,
    start: u128,
    end: u128,
    kind: MarkKind,
}

/// Start/finish marks of every test case in a run.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    marks: Vec<TimelineMark>,
    start_time: Instant,
}

impl ExecutionTimeline {
    pub fn new() -> Self {
        Self {
            marks: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn mark(&mut self, index: usize, test_case: impl Into<String>, kind: MarkKind) {
        self.marks.push(TimelineMark {
            index,
            test_case: test_case.into(),
            kind,
            at: Instant::now(),
        });
    }

    pub fn marks(&self) -> &[TimelineMark] {
        &self.marks
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// (start, end) offsets in milliseconds for finished test cases,
    /// ordered by start time. Marks are paired by test case position.
    fn spans(&self) -> Vec<Span> {
        let mut starts: HashMap<usize, u128> = HashMap::new();
        let mut spans = Vec::new();

        for mark in &self.marks {
            let offset = mark.at.duration_since(self.start_time).as_millis();
            match mark.kind {
                MarkKind::Started => {
                    starts.insert(mark.index, offset);
                }
                MarkKind::Succeeded | MarkKind::Failed => {
                    if let Some(start) = starts.remove(&mark.index) {
                        spans.push(Span {
                            index: mark.index,
                            test_case: mark.test_case.clone(),
                            start,
                            end: offset,
                            kind: mark.kind,
                        });
                    }
                }
            }
        }

        spans.sort_by_key(|span| (span.start, span.index));
        spans
    }

    /// Wall-clock duration in milliseconds of each finished test case,
    /// keyed by its position.
    pub fn durations(&self) -> HashMap<usize, u128> {
        self.spans()
            .into_iter()
            .map(|span| (span.index, span.end - span.start))
            .collect()
    }

    /// ASCII chart with one bar per finished test case.
    pub fn chart(&self) -> String {
        let mut output = String::from("\nTest Case Timeline:\n\n");

        let total_time = self.elapsed().as_millis();
        if total_time == 0 {
            return output;
        }

        let scale = CHART_WIDTH / total_time as f64;

        for span in self.spans() {
            let start_pos = (span.start as f64 * scale) as usize;
            let width = ((span.end - span.start) as f64 * scale).max(1.0) as usize;
            let fill = if span.kind == MarkKind::Failed { "x" } else { "#" };

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&fill.repeat(width));

            output.push_str(&format!(
                "{} |{}| ({} ms)\n",
                truncate(&span.test_case, LABEL_WIDTH),
                bar,
                span.end - span.start
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Pads or truncates a label to a fixed width.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Event sink that feeds an [`ExecutionTimeline`].
#[derive(Default)]
pub struct TimelineSink {
    timeline: Mutex<ExecutionTimeline>,
}

impl TimelineSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the timeline recorded so far.
    pub fn timeline(&self) -> ExecutionTimeline {
        self.timeline
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl EventSink for TimelineSink {
    fn emit(&self, event: &RunEvent) {
        let (index, test_case, kind) = match event {
            RunEvent::TestCaseStarted { index, test_case, .. } => {
                (*index, test_case, MarkKind::Started)
            }
            RunEvent::TestCaseFinished { index, test_case, status } => {
                let kind = match status {
                    OverallStatus::Success => MarkKind::Succeeded,
                    OverallStatus::Failure => MarkKind::Failed,
                };
                (*index, test_case, kind)
            }
            RunEvent::TestCaseFaulted { index, test_case, .. } => {
                (*index, test_case, MarkKind::Failed)
            }
            _ => return,
        };

        if let Ok(mut timeline) = self.timeline.lock() {
            timeline.mark(index, test_case.as_str(), kind);
        }
    }
}
