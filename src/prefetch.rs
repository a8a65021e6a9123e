//! Target Discovery
//!
//! Runs once before any test case is scheduled: inventories the controller
//! and resolves the UUID of the virtual service the workflows act on.

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::http::{resolve_url, HttpClient, HttpError, Method};
use crate::workflow::{ApiConfig, TestCase};

pub const VIRTUAL_SERVICE_ENDPOINT: &str = "/api/virtualservice";
pub const SERVICE_ENGINE_ENDPOINT: &str = "/api/serviceengine";
pub const TENANT_ENDPOINT: &str = "/api/tenant";

/// Errors that stop the run before scheduling.
#[derive(Debug, Error)]
pub enum PrefetchError {
    #[error("could not fetch virtual services: {0}")]
    ListFailed(#[source] HttpError),

    #[error("virtual service list is not valid JSON: {0}")]
    BadBody(#[from] serde_json::Error),

    #[error("no target virtual service name configured")]
    NoTargetName,

    #[error("target virtual service '{0}' not found")]
    TargetNotFound(String),

    #[error("could not extract UUID from target virtual service '{0}'")]
    MissingUuid(String),
}

/// Controller inventory and the resolved target.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefetchSummary {
    pub virtual_service_count: usize,
    /// `None` when the listing failed
    pub service_engine_count: Option<usize>,
    pub tenant_count: Option<usize>,
    pub target_name: String,
    pub target_uuid: String,
}

impl PrefetchSummary {
    /// One-line inventory, `N/A` for listings that failed.
    pub fn inventory_line(&self) -> String {
        fn count(c: Option<usize>) -> String {
            c.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string())
        }
        format!(
            "VS Count: {}, SE Count: {}, Tenant Count: {}",
            self.virtual_service_count,
            count(self.service_engine_count),
            count(self.tenant_count)
        )
    }
}

/// Inventories the controller and resolves `target_name` to its UUID.
pub fn discover_target(
    client: &dyn HttpClient,
    api: &ApiConfig,
    target_name: &str,
) -> Result<PrefetchSummary, PrefetchError> {
    info!("Pre-fetch: listing virtual services");
    let virtual_services = list_virtual_services(client, api)?;
    info!("Pre-fetch: found {} virtual services", virtual_services.len());

    let service_engine_count =
        count_listing(client, api, SERVICE_ENGINE_ENDPOINT, "service engines");
    let tenant_count = count_listing(client, api, TENANT_ENDPOINT, "tenants");

    let target = virtual_services
        .iter()
        .find(|vs| vs.get("name").and_then(Value::as_str) == Some(target_name))
        .ok_or_else(|| PrefetchError::TargetNotFound(target_name.to_string()))?;

    let target_uuid = target
        .get("url")
        .and_then(Value::as_str)
        .and_then(uuid_from_url)
        .ok_or_else(|| PrefetchError::MissingUuid(target_name.to_string()))?;

    let summary = PrefetchSummary {
        virtual_service_count: virtual_services.len(),
        service_engine_count,
        tenant_count,
        target_name: target_name.to_string(),
        target_uuid: target_uuid.to_string(),
    };

    info!("Pre-fetch summary: {}", summary.inventory_line());
    info!(
        "Identified target virtual service '{}' with UUID {}",
        summary.target_name, summary.target_uuid
    );
    Ok(summary)
}

/// Fetches the virtual service listing, expanding URL references into
/// their objects. Falls back to the raw listing if nothing expands.
fn list_virtual_services(
    client: &dyn HttpClient,
    api: &ApiConfig,
) -> Result<Vec<Value>, PrefetchError> {
    let url = resolve_url(&api.base_url, VIRTUAL_SERVICE_ENDPOINT, None);
    let response = client
        .request(Method::Get, &url, &api.headers, None)
        .map_err(PrefetchError::ListFailed)?;

    let raw = match response.json()? {
        Value::Object(mut map) if map.contains_key("results") => {
            map.remove("results").unwrap_or(Value::Null)
        }
        other => other,
    };
    let raw = match raw {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    let mut expanded = Vec::new();
    for item in &raw {
        match item {
            Value::String(reference) if reference.starts_with("http") => {
                match client
                    .request(Method::Get, reference, &api.headers, None)
                    .map(|r| r.json())
                {
                    Ok(Ok(object)) => expanded.push(object),
                    Ok(Err(e)) => warn!("Skipping {}: unparseable body: {}", reference, e),
                    Err(e) => warn!("Skipping {}: {}", reference, e),
                }
            }
            Value::Object(_) => expanded.push(item.clone()),
            _ => {}
        }
    }

    Ok(if expanded.is_empty() { raw } else { expanded })
}

/// Size of a listing, or `None` when it could not be fetched.
fn count_listing(
    client: &dyn HttpClient,
    api: &ApiConfig,
    endpoint: &str,
    what: &str,
) -> Option<usize> {
    let url = resolve_url(&api.base_url, endpoint, None);
    let body = match client.request(Method::Get, &url, &api.headers, None) {
        Ok(response) => response.json().ok(),
        Err(e) => {
            warn!("Could not fetch {}: {}", what, e);
            return None;
        }
    };

    let count = body.as_ref().and_then(count_entries);
    match count {
        Some(n) => info!("Pre-fetch: found {} {}", n, what),
        None => warn!("Could not count {}: unexpected body", what),
    }
    count
}

fn count_entries(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(items)) => Some(items.len()),
            _ => Some(map.len()),
        },
        _ => None,
    }
}

/// Last path segment of a resource URL.
pub fn uuid_from_url(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|segment| !segment.is_empty())
}

/// Target name from the first test case, as the controller tool does.
pub fn configured_target(test_cases: &[TestCase]) -> Option<&str> {
    test_cases.first().and_then(|tc| tc.target_vs_name.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockClient;
    use serde_json::json;

    const BASE: &str = "http://ctl";

    fn api() -> ApiConfig {
        ApiConfig {
            base_url: BASE.to_string(),
            headers: Default::default(),
        }
    }

    fn url(endpoint: &str) -> String {
        format!("{}{}", BASE, endpoint)
    }

    fn inventory(client: MockClient) -> MockClient {
        client
            .respond_json(&url(SERVICE_ENGINE_ENDPOINT), 200, json!([{}, {}]))
            .respond_json(&url(TENANT_ENDPOINT), 200, json!({"results": [{}, {}, {}]}))
    }

    #[test]
    fn test_discovers_target_from_results_wrapper() {
        let client = inventory(MockClient::new().respond_json(
            &url(VIRTUAL_SERVICE_ENDPOINT),
            200,
            json!({"count": 2, "results": [
                {"name": "other", "url": "http://ctl/api/virtualservice/vs-0"},
                {"name": "web-vs", "url": "http://ctl/api/virtualservice/vs-42"}
            ]}),
        ));

        let summary = discover_target(&client, &api(), "web-vs").unwrap();
        assert_eq!(summary.target_uuid, "vs-42");
        assert_eq!(summary.virtual_service_count, 2);
        assert_eq!(summary.service_engine_count, Some(2));
        assert_eq!(summary.tenant_count, Some(3));
    }

    #[test]
    fn test_expands_url_references() {
        let client = inventory(
            MockClient::new()
                .respond_json(
                    &url(VIRTUAL_SERVICE_ENDPOINT),
                    200,
                    json!(["http://ctl/vs/a", "http://ctl/vs/b", "http://ctl/vs/gone"]),
                )
                .respond_json(
                    "http://ctl/vs/a",
                    200,
                    json!({"name": "a", "url": "http://ctl/vs/a"}),
                )
                .respond_json(
                    "http://ctl/vs/b",
                    200,
                    json!({"name": "b", "url": "http://ctl/vs/uuid-b"}),
                ),
        );

        let summary = discover_target(&client, &api(), "b").unwrap();
        assert_eq!(summary.target_uuid, "uuid-b");
        // The failed reference is skipped
        assert_eq!(summary.virtual_service_count, 2);
    }

    #[test]
    fn test_missing_inventory_is_not_fatal() {
        let client = MockClient::new().respond_json(
            &url(VIRTUAL_SERVICE_ENDPOINT),
            200,
            json!([{"name": "web-vs", "url": "/api/virtualservice/u1"}]),
        );

        let summary = discover_target(&client, &api(), "web-vs").unwrap();
        assert_eq!(summary.service_engine_count, None);
        assert_eq!(summary.tenant_count, None);
        assert_eq!(
            summary.inventory_line(),
            "VS Count: 1, SE Count: N/A, Tenant Count: N/A"
        );
    }

    #[test]
    fn test_listing_failure_is_fatal() {
        let client = MockClient::new().respond(&url(VIRTUAL_SERVICE_ENDPOINT), 401, "denied");
        let err = discover_target(&client, &api(), "web-vs").unwrap_err();
        assert!(matches!(err, PrefetchError::ListFailed(_)));
    }

    #[test]
    fn test_unparseable_listing() {
        let client = MockClient::new().respond(&url(VIRTUAL_SERVICE_ENDPOINT), 200, "<html>");
        let err = discover_target(&client, &api(), "web-vs").unwrap_err();
        assert!(matches!(err, PrefetchError::BadBody(_)));
    }

    #[test]
    fn test_target_not_found() {
        let client = inventory(MockClient::new().respond_json(
            &url(VIRTUAL_SERVICE_ENDPOINT),
            200,
            json!([{"name": "other", "url": "http://ctl/vs/1"}]),
        ));
        let err = discover_target(&client, &api(), "web-vs").unwrap_err();
        assert!(matches!(err, PrefetchError::TargetNotFound(name) if name == "web-vs"));
    }

    #[test]
    fn test_target_without_uuid() {
        let client = inventory(MockClient::new().respond_json(
            &url(VIRTUAL_SERVICE_ENDPOINT),
            200,
            json!([{"name": "web-vs", "url": "http://ctl/vs/"}]),
        ));
        let err = discover_target(&client, &api(), "web-vs").unwrap_err();
        assert!(matches!(err, PrefetchError::MissingUuid(_)));
    }

    #[test]
    fn test_uuid_from_url() {
        assert_eq!(uuid_from_url("https://c/api/virtualservice/vs-1"), Some("vs-1"));
        assert_eq!(uuid_from_url("vs-1"), Some("vs-1"));
        assert_eq!(uuid_from_url("https://c/api/"), None);
        assert_eq!(uuid_from_url(""), None);
    }

    #[test]
    fn test_count_entries() {
        assert_eq!(count_entries(&json!([1, 2, 3])), Some(3));
        assert_eq!(count_entries(&json!({"results": [1]})), Some(1));
        assert_eq!(count_entries(&json!({"a": 1, "b": 2})), Some(2));
        assert_eq!(count_entries(&json!("text")), None);
    }

    #[test]
    fn test_configured_target_uses_first_test_case() {
        let cases = vec![
            TestCase::new("a").with_target("first-vs"),
            TestCase::new("b").with_target("second-vs"),
        ];
        assert_eq!(configured_target(&cases), Some("first-vs"));
        assert_eq!(configured_target(&[TestCase::new("x")]), None);
        assert_eq!(configured_target(&[]), None);
    }
}
