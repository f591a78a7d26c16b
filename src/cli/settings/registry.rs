//! Registry of setting handlers.

use std::collections::HashMap;

use super::error::SettingError;
use super::handlers::{LogLevelHandler, RoutingHandler, ServerUrlHandler, SessionTimeoutHandler};
use super::SettingHandler;
use crate::core::config::data::Config;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `config show` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(ServerUrlHandler));
        registry.register(Box::new(LogLevelHandler));
        registry.register(Box::new(RoutingHandler));
        registry.register(Box::new(SessionTimeoutHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key. Underscores are accepted in place of dashes.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        let key = key.trim().to_ascii_lowercase().replace('_', "-");
        self.handlers.get(key.as_str()).map(|h| h.as_ref())
    }

    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }

    pub fn set(&self, key: &str, value: &str, config: &mut Config) -> Result<String, SettingError> {
        self.handler(key)?.set(value, config)
    }

    pub fn unset(&self, key: &str, config: &mut Config) -> Result<String, SettingError> {
        Ok(self.handler(key)?.unset(config))
    }

    /// Lists every key with its current value, in display order.
    pub fn format_all(&self, config: &Config) -> String {
        let mut lines = vec!["Current configuration:".to_string()];
        for key in &self.display_order {
            if let Some(handler) = self.handlers.get(key) {
                lines.push(handler.format(config));
            }
        }
        lines.join("\n")
    }

    fn handler(&self, key: &str) -> Result<&dyn SettingHandler, SettingError> {
        self.get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
