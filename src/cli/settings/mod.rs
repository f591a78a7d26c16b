//! Settings management for `config set` / `config unset`.
//!
//! Each key has a handler that validates input and edits a [`Config`]
//! snapshot; the caller persists the result.

pub mod error;
pub mod handlers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::data::Config;

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Validates `value` and stores it, returning a success message.
    fn set(&self, value: &str, config: &mut Config) -> Result<String, SettingError>;

    fn unset(&self, config: &mut Config) -> String;

    /// Format the current value for display.
    fn format(&self, config: &Config) -> String;
}

pub(crate) fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub(crate) fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}
