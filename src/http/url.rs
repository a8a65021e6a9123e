//! Request URL Resolution

/// Placeholder replaced by the target identifier.
pub const UUID_PLACEHOLDER: &str = "{uuid}";

/// Returns true for scheme-prefixed endpoints.
pub fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

/// Builds the request URL for an endpoint.
///
/// Absolute endpoints pass through unchanged. Relative ones are joined to
/// `base_url` with exactly one `/`. Every `{uuid}` is then replaced with
/// `target_uuid` when it is known and non-empty.
///
/// ```
/// use apirunner::http::resolve_url;
///
/// let url = resolve_url("https://ctl/", "api/virtualservice/{uuid}", Some("vs-1"));
/// assert_eq!(url, "https://ctl/api/virtualservice/vs-1");
/// ```
pub fn resolve_url(base_url: &str, endpoint: &str, target_uuid: Option<&str>) -> String {
    let url = if is_absolute(endpoint) {
        endpoint.to_string()
    } else {
        let base = base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    };

    match target_uuid {
        Some(uuid) if !uuid.is_empty() => url.replace(UUID_PLACEHOLDER, uuid),
        _ => url,
    }
}
