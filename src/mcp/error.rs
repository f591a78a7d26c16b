use std::error::Error as StdError;
use std::fmt;

/// Failures surfaced by the MCP session client.
///
/// Every variant is recovered where it occurs; only [`McpError::Connection`]
/// ends the SSE listener, and even that leaves the command loop running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpError {
    /// The SSE stream could not be opened or dropped mid-session.
    Connection(String),

    /// A command was attempted before the server announced a session id.
    SessionNotReady,

    /// An event's data was not valid JSON.
    MalformedPayload {
        /// The raw event text, kept verbatim for display.
        raw: String,
        /// Parser error message.
        reason: String,
    },

    /// Input typed into the shell was rejected before any network call.
    InvalidUserInput(String),

    /// A name-filtered lookup found no tool with that name.
    ToolNotFound(String),

    /// The command POST failed or returned a non-success status.
    Http(String),

    /// Waiting for a session or a response exceeded the configured limit.
    Timeout(String),
}

impl fmt::Display for McpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McpError::Connection(reason) => write!(f, "Error connecting to SSE stream: {reason}"),
            McpError::SessionNotReady => write!(
                f,
                "No session ID available. Make sure the SSE listener is running."
            ),
            McpError::MalformedPayload { reason, .. } => {
                write!(f, "Event data is not valid JSON: {reason}")
            }
            McpError::InvalidUserInput(reason) => write!(f, "Invalid input: {reason}"),
            McpError::ToolNotFound(name) => write!(f, "Tool '{name}' not found."),
            McpError::Http(reason) => write!(f, "Error sending command: {reason}"),
            McpError::Timeout(what) => write!(f, "Timed out waiting for {what}"),
        }
    }
}

impl StdError for McpError {}
