//! Effective runtime settings.
//!
//! Each value is taken from the first source that provides it: command-line
//! flag, environment variable, config file, built-in default.

use crate::core::config::data::Config;
use crate::core::constants::{
    DEFAULT_LOG_LEVEL, DEFAULT_SERVER_URL, ENV_LOG_LEVEL, ENV_ROUTING, ENV_SERVER_URL,
};
use crate::mcp::router::RoutingMode;
use crate::utils::url::normalize_base_url;
use std::time::Duration;
use tracing::warn;

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub log_level: Option<String>,
    pub routing: Option<RoutingMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub log_level: String,
    pub routing: RoutingMode,
    pub session_timeout: Option<Duration>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    /// Resolves settings using `env` to look up environment variables.
    pub fn resolve<F>(config: &Config, overrides: Overrides, env: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = non_empty(overrides.server_url)
            .or_else(|| non_empty(env(ENV_SERVER_URL)))
            .or_else(|| non_empty(config.server_url.clone()))
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        let log_level = non_empty(overrides.log_level)
            .or_else(|| non_empty(env(ENV_LOG_LEVEL)))
            .or_else(|| non_empty(config.log_level.clone()))
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let env_routing = non_empty(env(ENV_ROUTING)).and_then(|raw| match raw.parse() {
            Ok(mode) => Some(mode),
            Err(err) => {
                warn!(variable = ENV_ROUTING, "{err}; ignoring");
                None
            }
        });
        let routing = overrides
            .routing
            .or(env_routing)
            .or(config.routing)
            .unwrap_or_default();

        Settings {
            server_url,
            log_level,
            routing,
            session_timeout: config.session_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn from_process_env(config: &Config, overrides: Overrides) -> Settings {
        Self::resolve(config, overrides, |name| std::env::var(name).ok())
    }
}
