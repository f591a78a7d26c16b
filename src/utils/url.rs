//! URL utilities for consistent endpoint construction
//!
//! Server URLs come from flags, environment and config files, so they may or
//! may not carry a trailing slash. These helpers keep the derived SSE and
//! message endpoints free of double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use intelligent_cd_mcp::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:3000"), "http://localhost:3000");
/// assert_eq!(normalize_base_url("http://localhost:3000/"), "http://localhost:3000");
/// assert_eq!(normalize_base_url("http://mcp.internal/k8s///"), "http://mcp.internal/k8s");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path
///
/// The endpoint may carry a query string; only its leading slashes are
/// stripped.
///
/// # Examples
///
/// ```
/// use intelligent_cd_mcp::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:3000", "sse"),
///     "http://localhost:3000/sse"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:3000/", "/messages?sessionId=abc123"),
///     "http://localhost:3000/messages?sessionId=abc123"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}
