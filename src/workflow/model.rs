//! Run Configuration Model
//!
//! Core data structures describing the API under test, the run settings
//! and the test cases with their ordered workflow steps.
//!
//! # Example YAML Format
//!
//! ```yaml
//! api:
//!   base_url: https://controller.example.com
//!   headers:
//!     X-Avi-Version: "22.1.3"
//!
//! settings:
//!   parallel_execution_count: 2
//!
//! test_cases:
//!   - id: TC-001
//!     target_vs_name: web-vs
//!     workflow:
//!       - stage: check_enabled
//!         type: GET
//!         endpoint: /api/virtualservice/{uuid}
//!         validation_check:
//!           enabled: true
//!
//!       - stage: disable
//!         type: PUT
//!         endpoint: /api/virtualservice/{uuid}
//!         payload:
//!           enabled: false
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host shown by mock steps when the test case names no target.
pub const DEFAULT_MOCK_HOST: &str = "target_host";

/// Top-level run configuration.
///
/// Loaded once before the run and shared read-only by every worker.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Connection details for the API under test
    pub api: ApiConfig,

    /// Ordered list of test cases
    pub test_cases: Vec<TestCase>,

    /// Execution tuning
    #[serde(default)]
    pub settings: Settings,
}

/// Base URL and static headers applied to every request.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,

    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Execution settings with defaults for every field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Maximum number of test cases running at once
    #[serde(default = "default_parallel_execution_count")]
    pub parallel_execution_count: usize,

    /// Artificial delay of MOCK_SSH / MOCK_RDP steps
    #[serde(default = "default_mock_delay_ms")]
    pub mock_delay_ms: u64,

    /// Per-request timeout handed to the HTTP client
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Report CONTENT_PASS instead of PASS for fully validated steps
    #[serde(default)]
    pub report_content_pass: bool,
}

fn default_parallel_execution_count() -> usize {
    2
}

fn default_mock_delay_ms() -> u64 {
    500
}

fn default_http_timeout_secs() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            parallel_execution_count: default_parallel_execution_count(),
            mock_delay_ms: default_mock_delay_ms(),
            http_timeout_secs: default_http_timeout_secs(),
            report_content_pass: false,
        }
    }
}

/// One independently scheduled test case.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TestCase {
    #[serde(default = "default_test_case_id")]
    pub id: String,

    /// Name of the virtual service this test case targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_vs_name: Option<String>,

    /// Steps executed strictly in order
    #[serde(default)]
    pub workflow: Vec<Step>,
}

fn default_test_case_id() -> String {
    "UNKNOWN".to_string()
}

impl TestCase {
    /// Creates an empty test case.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target_vs_name: None,
            workflow: Vec::new(),
        }
    }

    /// Sets the target virtual service name.
    pub fn with_target(mut self, name: impl Into<String>) -> Self {
        self.target_vs_name = Some(name.into());
        self
    }

    /// Appends a step to the workflow.
    pub fn with_step(mut self, step: Step) -> Self {
        self.workflow.push(step);
        self
    }

    /// Host name displayed by mock connection steps.
    pub fn mock_host(&self) -> &str {
        self.target_vs_name.as_deref().unwrap_or(DEFAULT_MOCK_HOST)
    }
}

/// The fixed set of step kinds the interpreter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    MockSsh,
    MockRdp,
    Get,
    Put,
    /// Anything else; reported as SKIPPED
    Unknown(String),
}

impl StepKind {
    /// Parses a step type name, ignoring case. Surrounding whitespace is
    /// kept, so `" GET "` is an unknown type.
    pub fn parse(raw: &str) -> Self {
        match raw.to_uppercase().as_str() {
            "MOCK_SSH" => Self::MockSsh,
            "MOCK_RDP" => Self::MockRdp,
            "GET" => Self::Get,
            "PUT" => Self::Put,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Upper-case label used in progress output.
    pub fn label(&self) -> &str {
        match self {
            Self::MockSsh => "MOCK_SSH",
            Self::MockRdp => "MOCK_RDP",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Unknown(name) => name,
        }
    }
}

/// A single stage of a test case workflow.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Step {
    /// Label the outcome is reported under
    #[serde(default = "default_stage")]
    pub stage: String,

    /// Step type name (MOCK_SSH, MOCK_RDP, GET, PUT)
    #[serde(rename = "type", default)]
    pub step_type: String,

    /// Absolute URL or path relative to the API base URL; may contain `{uuid}`
    #[serde(default)]
    pub endpoint: String,

    /// JSON body sent with PUT requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,

    #[serde(default = "default_expected_status")]
    pub expected_status: u16,

    /// Dotted key path -> expected value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_check: Option<IndexMap<String, Value>>,
}

fn default_stage() -> String {
    "unnamed_stage".to_string()
}

fn default_expected_status() -> u16 {
    200
}

impl Step {
    /// Creates a step with the given stage label and type.
    ///
    /// # Example
    ///
    /// ```
    /// use apirunner::workflow::Step;
    ///
    /// let step = Step::new("check", "GET")
    ///     .with_endpoint("/api/virtualservice/{uuid}")
    ///     .with_check("enabled", serde_json::json!(true));
    /// ```
    pub fn new(stage: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            step_type: step_type.into(),
            endpoint: String::new(),
            payload: None,
            expected_status: default_expected_status(),
            validation_check: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Adds one validation entry.
    pub fn with_check(mut self, path: impl Into<String>, expected: Value) -> Self {
        self.validation_check
            .get_or_insert_with(IndexMap::new)
            .insert(path.into(), expected);
        self
    }

    /// Parsed step kind.
    pub fn kind(&self) -> StepKind {
        StepKind::parse(&self.step_type)
    }

    /// Validation entries, if any are configured.
    pub fn checks(&self) -> Option<&IndexMap<String, Value>> {
        self.validation_check.as_ref().filter(|checks| !checks.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_kind_case_insensitive() {
        assert_eq!(StepKind::parse("get"), StepKind::Get);
        assert_eq!(StepKind::parse("Put"), StepKind::Put);
        assert_eq!(StepKind::parse("mock_ssh"), StepKind::MockSsh);
        assert_eq!(StepKind::parse("MOCK_RDP"), StepKind::MockRdp);
        assert_eq!(
            StepKind::parse("telnet"),
            StepKind::Unknown("TELNET".to_string())
        );
        assert_eq!(
            StepKind::parse(" get "),
            StepKind::Unknown(" GET ".to_string())
        );
    }

    #[test]
    fn test_step_kind_label() {
        assert_eq!(StepKind::parse("mock_ssh").label(), "MOCK_SSH");
        assert_eq!(StepKind::parse("ftp").label(), "FTP");
        assert_eq!(StepKind::parse("").label(), "");
    }

    #[test]
    fn test_step_defaults_from_yaml() {
        let step: Step = serde_yaml::from_str("type: GET").unwrap();

        assert_eq!(step.stage, "unnamed_stage");
        assert_eq!(step.expected_status, 200);
        assert_eq!(step.endpoint, "");
        assert!(step.payload.is_none());
        assert!(step.checks().is_none());
    }

    #[test]
    fn test_step_validation_check_keeps_order() {
        let yaml = r#"
stage: verify
type: GET
validation_check:
  zeta: 1
  alpha.beta: "x"
  middle: true
"#;
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<&String> = step.checks().unwrap().keys().collect();

        assert_eq!(keys, vec!["zeta", "alpha.beta", "middle"]);
        assert_eq!(step.checks().unwrap()["middle"], json!(true));
    }

    #[test]
    fn test_empty_validation_check_is_ignored() {
        let step: Step = serde_yaml::from_str("type: GET\nvalidation_check: {}").unwrap();
        assert!(step.validation_check.is_some());
        assert!(step.checks().is_none());
    }

    #[test]
    fn test_step_builder() {
        let step = Step::new("update", "PUT")
            .with_endpoint("/api/virtualservice/{uuid}")
            .with_payload(json!({"enabled": false}))
            .with_expected_status(202)
            .with_check("enabled", json!(false));

        assert_eq!(step.kind(), StepKind::Put);
        assert_eq!(step.expected_status, 202);
        assert_eq!(step.payload, Some(json!({"enabled": false})));
        assert_eq!(step.checks().unwrap().len(), 1);
    }

    #[test]
    fn test_test_case_mock_host() {
        assert_eq!(TestCase::new("a").mock_host(), DEFAULT_MOCK_HOST);
        assert_eq!(TestCase::new("a").with_target("vs-1").mock_host(), "vs-1");
    }

    #[test]
    fn test_config_settings_default_when_missing() {
        let yaml = r#"
api:
  base_url: http://localhost
test_cases:
  - id: one
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.parallel_execution_count, 2);
        assert_eq!(config.settings.mock_delay_ms, 500);
        assert_eq!(config.test_cases[0].id, "one");
        assert!(config.test_cases[0].workflow.is_empty());
    }

    #[test]
    fn test_config_headers_keep_order() {
        let yaml = r#"
api:
  base_url: http://localhost
  headers:
    X-Second: "2"
    Authorization: "Basic abc"
test_cases: []
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let names: Vec<&String> = config.api.headers.keys().collect();
        assert_eq!(names, vec!["X-Second", "Authorization"]);
    }

    #[test]
    fn test_config_requires_api_section() {
        let result: Result<Config, _> = serde_yaml::from_str("test_cases: []");
        assert!(result.is_err());
    }
}
