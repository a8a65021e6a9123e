//! Response Content Checks
//!
//! Resolves dotted key paths (`a.b.c`) inside a JSON response body and
//! compares the values found against the expected ones. A path that
//! cannot be resolved is a mismatch, never an error.

use indexmap::IndexMap;
use serde_json::Value;

/// Result of resolving a dotted key path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    Found(&'a Value),
    NotFound,
}

impl<'a> Resolved<'a> {
    pub fn value(&self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

/// Descends through nested objects one `.`-separated segment at a time.
///
/// ```
/// use apirunner::execution::checks::{resolve_path, Resolved};
/// use serde_json::json;
///
/// let body = json!({"a": {"b": {"c": 5}}});
/// assert_eq!(resolve_path(&body, "a.b.c"), Resolved::Found(&json!(5)));
/// assert_eq!(resolve_path(&json!({"a": {"b": {}}}), "a.b.c"), Resolved::NotFound);
/// ```
pub fn resolve_path<'a>(body: &'a Value, path: &str) -> Resolved<'a> {
    let mut current = body;

    for segment in path.split('.') {
        match current.as_object().and_then(|map| map.get(segment)) {
            Some(next) => current = next,
            None => return Resolved::NotFound,
        }
    }

    Resolved::Found(current)
}

/// Equality with numeric values compared by magnitude, so `5 == 5.0`.
pub fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) if a.is_f64() || b.is_f64() => x == y,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => actual == expected,
    }
}

/// Outcome of a single key check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub path: String,
    pub expected: Value,
    /// `None` when the path did not resolve
    pub actual: Option<Value>,
    pub passed: bool,
}

/// Per-key results in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    /// True when every key matched.
    pub fn passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Evaluates every check against the body. All keys are evaluated even
/// after a mismatch.
pub fn evaluate_checks(body: &Value, checks: &IndexMap<String, Value>) -> CheckReport {
    let results = checks
        .iter()
        .map(|(path, expected)| {
            let resolved = resolve_path(body, path);
            let passed = resolved
                .value()
                .is_some_and(|actual| values_equal(actual, expected));

            CheckResult {
                path: path.clone(),
                expected: expected.clone(),
                actual: resolved.value().cloned(),
                passed,
            }
        })
        .collect();

    CheckReport { results }
}
