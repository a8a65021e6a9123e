//! HTTP Client
//!
//! The transport seam between the step executor and the API under test.
//! Step execution only depends on the [`HttpClient`] trait, so tests can
//! substitute canned responses for the blocking `reqwest` implementation.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use thiserror::Error;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// HTTP methods used by workflow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Body as lossy UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request failures surfaced by the transport.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection refused, DNS failure, timeout and similar
    #[error("connection error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The client could not be built or the request could not be formed
    #[error("client error: {0}")]
    Client(String),
}

/// Blocking HTTP capability used by workflow steps.
///
/// Implementations must be shareable across worker threads.
pub trait HttpClient: Send + Sync {
    /// Sends one request. Non-2xx statuses are reported as [`HttpError::Status`].
    fn request(
        &self,
        method: Method,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Option<&Value>,
    ) -> Result<HttpResponse, HttpError>;
}

/// Production client backed by `reqwest::blocking`.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn request(
        &self,
        method: Method,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Option<&Value>,
    ) -> Result<HttpResponse, HttpError> {
        let mut req = match method {
            Method::Get => self.client.get(url),
            Method::Put => self.client.put(url),
        };

        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().map_err(|e| {
            if e.is_builder() {
                HttpError::Client(e.to_string())
            } else {
                HttpError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        debug!("{} {} -> {} ({} bytes)", method, url, status, bytes.len());

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(HttpResponse::new(status.as_u16(), bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Put.as_str(), "PUT");
    }

    #[test]
    fn test_response_json() {
        let response = HttpResponse::new(200, r#"{"enabled": true}"#);
        assert_eq!(response.json().unwrap(), json!({"enabled": true}));
    }

    #[test]
    fn test_response_invalid_json() {
        let response = HttpResponse::new(200, "<html>oops</html>");
        assert!(response.json().is_err());
        assert_eq!(response.text(), "<html>oops</html>");
    }

    #[test]
    fn test_status_error_message() {
        let err = HttpError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: not found");
    }

    #[test]
    fn test_reqwest_client_connection_refused() {
        let client = ReqwestClient::with_timeout(Duration::from_secs(2)).unwrap();
        let result = client.request(
            Method::Get,
            "http://127.0.0.1:1/unreachable",
            &IndexMap::new(),
            None,
        );
        assert!(matches!(result, Err(HttpError::Transport(_))));
    }
}
