//! HTTP plumbing shared by the SSE listener and the command dispatcher.
//!
//! The server exposes three endpoints under one base URL: `/sse` for the
//! event stream, `/messages?sessionId=<id>` for commands and `/health`.

use crate::utils::url::construct_api_url;
use std::time::Duration;

pub mod sse;

pub const MCP_JSON_CONTENT_TYPE: &str = "application/json";
pub const MCP_EVENT_STREAM_ACCEPT: &str = "text/event-stream";
pub const SSE_PATH: &str = "sse";
pub const MESSAGES_PATH: &str = "messages";
pub const HEALTH_PATH: &str = "health";

const MCP_HTTP_CONNECT_TIMEOUT_SECONDS: u64 = 10;
const MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS: u64 = 90;
const MCP_HTTP_POOL_MAX_IDLE_PER_HOST: usize = 8;

/// Builds the shared HTTP client.
///
/// There is no overall request timeout: the SSE response body stays open for
/// the lifetime of the session.
pub fn build_mcp_http_client() -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(MCP_HTTP_CONNECT_TIMEOUT_SECONDS))
        .pool_idle_timeout(Duration::from_secs(MCP_HTTP_POOL_IDLE_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(MCP_HTTP_POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|err| err.to_string())
}

pub fn sse_url(base_url: &str) -> String {
    construct_api_url(base_url, SSE_PATH)
}

pub fn health_url(base_url: &str) -> String {
    construct_api_url(base_url, HEALTH_PATH)
}

/// Session-scoped command endpoint: `{base}/messages?sessionId={id}`.
pub fn messages_url(base_url: &str, session_id: &str) -> String {
    format!(
        "{}?sessionId={}",
        construct_api_url(base_url, MESSAGES_PATH),
        session_id
    )
}

pub fn apply_sse_request_headers(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request
        .header("Accept", MCP_EVENT_STREAM_ACCEPT)
        .header("Cache-Control", "no-cache")
}

pub fn apply_command_post_headers(request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request.header("Content-Type", MCP_JSON_CONTENT_TYPE)
}

pub fn is_event_stream_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case(MCP_EVENT_STREAM_ACCEPT))
}
