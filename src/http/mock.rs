//! Canned-response client for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use serde_json::Value;

use super::client::{HttpClient, HttpError, HttpResponse, Method};

#[derive(Debug, Clone)]
pub enum Canned {
    Response { status: u16, body: String },
    Transport(String),
    Panic,
}

#[derive(Debug, Clone)]
struct Route {
    reply: Canned,
    delay: Duration,
}

/// A request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub url: String,
    pub headers: IndexMap<String, String>,
    pub body: Option<Value>,
}

/// Replies from a fixed URL table. Unknown URLs fail as transport errors.
#[derive(Default)]
pub struct MockClient {
    routes: HashMap<String, Route>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.route(url, Canned::Response { status, body: body.to_string() }, Duration::ZERO)
    }

    pub fn respond_json(self, url: &str, status: u16, body: Value) -> Self {
        self.respond(url, status, &body.to_string())
    }

    pub fn respond_after(self, url: &str, delay: Duration, status: u16, body: &str) -> Self {
        self.route(url, Canned::Response { status, body: body.to_string() }, delay)
    }

    pub fn fail(self, url: &str, reason: &str) -> Self {
        self.route(url, Canned::Transport(reason.to_string()), Duration::ZERO)
    }

    pub fn panic_on(self, url: &str) -> Self {
        self.route(url, Canned::Panic, Duration::ZERO)
    }

    fn route(mut self, url: &str, reply: Canned, delay: Duration) -> Self {
        self.routes.insert(url.to_string(), Route { reply, delay });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

impl HttpClient for MockClient {
    fn request(
        &self,
        method: Method,
        url: &str,
        headers: &IndexMap<String, String>,
        body: Option<&Value>,
    ) -> Result<HttpResponse, HttpError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method,
                url: url.to_string(),
                headers: headers.clone(),
                body: body.cloned(),
            });
        }

        let Some(route) = self.routes.get(url) else {
            return Err(HttpError::Transport(format!("no route for {}", url)));
        };

        if !route.delay.is_zero() {
            thread::sleep(route.delay);
        }

        match &route.reply {
            Canned::Response { status, body } if (200..300).contains(status) => {
                Ok(HttpResponse::new(*status, body.as_bytes().to_vec()))
            }
            Canned::Response { status, body } => Err(HttpError::Status {
                status: *status,
                body: body.clone(),
            }),
            Canned::Transport(reason) => Err(HttpError::Transport(reason.clone())),
            Canned::Panic => panic!("mock transport fault for {}", url),
        }
    }
}
