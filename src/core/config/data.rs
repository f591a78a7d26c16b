use crate::mcp::router::RoutingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted configuration. Every field is optional so an absent file and
/// an empty file behave the same.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the MCP server, e.g. `http://localhost:3000`
    pub server_url: Option<String>,
    /// Diagnostic log level (`trace`..`error`)
    pub log_level: Option<String>,
    /// How responses are matched to the commands that caused them
    pub routing: Option<RoutingMode>,
    /// Upper bound in seconds on waiting for the session bootstrap
    pub session_timeout_secs: Option<u64>,
}

/// Renders `path` with the home directory shortened to `~`.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
