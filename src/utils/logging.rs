//! Diagnostic logging setup.
//!
//! Logs go to stderr so they never interleave with the menu and results
//! printed on stdout.

use tracing_subscriber::EnvFilter;

const QUIET_DEPENDENCIES: &str = "reqwest=warn,hyper=warn,hyper_util=warn";

/// Maps a user supplied level name onto a tracing level.
///
/// Accepts the names Python-style loggers use as well; anything unknown
/// falls back to `info`.
pub fn normalize_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
}

pub fn filter_directives(level: &str) -> String {
    format!("{},{}", normalize_level(level), QUIET_DEPENDENCIES)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
