//! HTTP Transport Module
//!
//! - [`client`]: The [`HttpClient`] capability and its `reqwest` implementation
//! - [`url`]: Endpoint to URL resolution with `{uuid}` substitution

pub mod client;
#[cfg(test)]
pub(crate) mod mock;
pub mod url;

pub use client::{HttpClient, HttpError, HttpResponse, Method, ReqwestClient};
pub use url::{is_absolute, resolve_url};
