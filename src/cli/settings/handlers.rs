//! Handlers for the individual config keys.

use super::error::SettingError;
use super::{success_set, success_unset, SettingHandler};
use crate::core::config::data::Config;
use crate::mcp::router::RoutingMode;
use crate::utils::logging::normalize_level;
use crate::utils::url::normalize_base_url;

/// Handler for the `server-url` setting.
pub struct ServerUrlHandler;

impl SettingHandler for ServerUrlHandler {
    fn key(&self) -> &'static str {
        "server-url"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        let url = normalize_base_url(value);
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingError::InvalidValue {
                key: "server-url",
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }
        let message = success_set(self.key(), &url);
        config.server_url = Some(url);
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        config.server_url = None;
        success_unset(self.key())
    }

    fn format(&self, config: &Config) -> String {
        match &config.server_url {
            Some(url) => format!("  server-url: {url}"),
            None => "  server-url: (unset)".to_string(),
        }
    }
}

/// Handler for the `log-level` setting.
pub struct LogLevelHandler;

impl SettingHandler for LogLevelHandler {
    fn key(&self) -> &'static str {
        "log-level"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        let trimmed = value.trim().to_ascii_lowercase();
        let level = normalize_level(&trimmed);
        // normalize_level maps unknown names to info; only accept real ones.
        if level == "info" && trimmed != "info" {
            return Err(SettingError::InvalidValue {
                key: "log-level",
                reason: format!("unknown level '{value}'"),
            });
        }
        let message = success_set(self.key(), level);
        config.log_level = Some(level.to_string());
        Ok(message)
    }

    fn unset(&self, config: &mut Config) -> String {
        config.log_level = None;
        success_unset(self.key())
    }

    fn format(&self, config: &Config) -> String {
        match &config.log_level {
            Some(level) => format!("  log-level: {level}"),
            None => "  log-level: (unset)".to_string(),
        }
    }
}

/// Handler for the `routing` setting.
pub struct RoutingHandler;

impl SettingHandler for RoutingHandler {
    fn key(&self) -> &'static str {
        "routing"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        let mode: RoutingMode = value.parse().map_err(|reason| SettingError::InvalidValue {
            key: "routing",
            reason,
        })?;
        config.routing = Some(mode);
        Ok(success_set(self.key(), mode.as_str()))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.routing = None;
        success_unset(self.key())
    }

    fn format(&self, config: &Config) -> String {
        match &config.routing {
            Some(mode) => format!("  routing: {mode}"),
            None => "  routing: (unset)".to_string(),
        }
    }
}

/// Handler for the `session-timeout` setting, in whole seconds.
pub struct SessionTimeoutHandler;

impl SettingHandler for SessionTimeoutHandler {
    fn key(&self) -> &'static str {
        "session-timeout"
    }

    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError> {
        let raw = value.trim().trim_end_matches('s');
        let secs = raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| SettingError::InvalidValue {
                key: "session-timeout",
                reason: format!("expected a positive number of seconds, got '{value}'"),
            })?;
        config.session_timeout_secs = Some(secs);
        Ok(success_set(self.key(), &format!("{secs}s")))
    }

    fn unset(&self, config: &mut Config) -> String {
        config.session_timeout_secs = None;
        success_unset(self.key())
    }

    fn format(&self, config: &Config) -> String {
        match config.session_timeout_secs {
            Some(secs) => format!("  session-timeout: {secs}s"),
            None => "  session-timeout: (unset)".to_string(),
        }
    }
}
