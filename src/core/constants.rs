//! Shared constants used across the application

use std::time::Duration;

/// Server queried when no flag, environment variable or config entry names one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// How long one-shot commands wait for their correlated response.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on session establishment for one-shot commands when none is configured.
pub const ONE_SHOT_SESSION_TIMEOUT: Duration = Duration::from_secs(15);

pub const ENV_SERVER_URL: &str = "MCP_SERVER_URL";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_ROUTING: &str = "MCP_ROUTING";
