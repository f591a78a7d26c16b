//! Response correlation for the shared SSE stream.
//!
//! Every response arrives on one event stream, so something has to decide
//! which logical operation an inbound payload answers. Two strategies exist:
//!
//! - [`RoutingMode::ById`] keeps one [`PendingIntent`] per outstanding
//!   request id and resolves responses by the id they echo. Listing-shaped
//!   responses without an id fall back to the oldest outstanding listing.
//! - [`RoutingMode::Intent`] keeps a single slot that the next
//!   `result.tools`-shaped payload consumes. A newer listing request
//!   overwrites an older one, so overlapping listings can be misattributed.

use crate::mcp::error::McpError;
use crate::mcp::events::SessionEvent;
use crate::mcp::protocol::{
    call_result_is_error, find_tool, format_rpc_error, listed_tools, pretty, render_call_result,
    response_id, rpc_error, tool_name, RequestId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What the response to a dispatched request should be interpreted as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingIntent {
    #[default]
    None,
    ExpectToolNames,
    ExpectToolInfo(String),
    ExpectToolResult(String),
}

impl PendingIntent {
    fn is_listing(&self) -> bool {
        matches!(
            self,
            PendingIntent::ExpectToolNames | PendingIntent::ExpectToolInfo(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMode {
    #[default]
    ById,
    Intent,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::ById => "by-id",
            RoutingMode::Intent => "intent",
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "by-id" | "by_id" | "id" => Ok(RoutingMode::ById),
            "intent" | "shape" => Ok(RoutingMode::Intent),
            other => Err(format!(
                "Unsupported routing mode: {other} (expected 'by-id' or 'intent')"
            )),
        }
    }
}

/// A correlated, display-ready result.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedOutput {
    Session(String),
    ToolNames {
        id: Option<RequestId>,
        names: Vec<String>,
    },
    ToolInfo {
        id: Option<RequestId>,
        name: String,
        descriptor: Option<Value>,
    },
    ToolResult {
        id: RequestId,
        name: String,
        payload: Value,
    },
    Payload(Value),
    Raw(String),
    Closed(Option<String>),
}

impl RoutedOutput {
    /// Request id this output answers, when known.
    pub fn request_id(&self) -> Option<RequestId> {
        match self {
            RoutedOutput::ToolNames { id, .. } | RoutedOutput::ToolInfo { id, .. } => *id,
            RoutedOutput::ToolResult { id, .. } => Some(*id),
            RoutedOutput::Payload(payload) => response_id(payload),
            _ => None,
        }
    }

    /// True when this output is the answer to request `id`.
    ///
    /// Listing outputs routed without an id (intent mode, or a server that
    /// does not echo ids) are accepted as answers to any listing request.
    pub fn answers(&self, id: RequestId) -> bool {
        match self {
            RoutedOutput::ToolNames { id: None, .. } | RoutedOutput::ToolInfo { id: None, .. } => {
                true
            }
            _ => self.request_id() == Some(id),
        }
    }
}

impl fmt::Display for RoutedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutedOutput::Session(session_id) => write!(
                f,
                "Session established. Session ID: {session_id}\nYou can now send commands."
            ),
            RoutedOutput::ToolNames { names, .. } => {
                writeln!(f, "--- Tool Names ---")?;
                for name in names {
                    writeln!(f, "• {name}")?;
                }
                write!(f, "Total: {} tools", names.len())
            }
            RoutedOutput::ToolInfo {
                name,
                descriptor: Some(descriptor),
                ..
            } => write!(f, "--- Tool Info for '{name}' ---\n{}", pretty(descriptor)),
            RoutedOutput::ToolInfo {
                name,
                descriptor: None,
                ..
            } => write!(f, "{}", McpError::ToolNotFound(name.clone())),
            RoutedOutput::ToolResult { id, name, payload } => {
                writeln!(f, "--- Result of '{name}' (request {id}) ---")?;
                if let Some(error) = rpc_error(payload) {
                    return write!(f, "{}", format_rpc_error(&error));
                }
                match payload.get("result") {
                    Some(result) if call_result_is_error(result) => {
                        write!(f, "Tool reported an error:\n{}", render_call_result(result))
                    }
                    Some(result) => write!(f, "{}", render_call_result(result)),
                    None => write!(f, "{}", pretty(payload)),
                }
            }
            RoutedOutput::Payload(payload) => {
                write!(f, "[EVENT RECEIVED]:\n{}", pretty(payload))
            }
            RoutedOutput::Raw(text) => write!(f, "[RAW EVENT RECEIVED]:\n{text}"),
            RoutedOutput::Closed(Some(reason)) => {
                write!(f, "SSE listener stopped: {reason}")
            }
            RoutedOutput::Closed(None) => write!(f, "SSE listener stopped."),
        }
    }
}

/// Owns all pending-intent state; only the correlator task touches it.
#[derive(Debug, Default)]
pub struct Correlator {
    mode: RoutingMode,
    slot: PendingIntent,
    table: BTreeMap<RequestId, PendingIntent>,
}

impl Correlator {
    pub fn new(mode: RoutingMode) -> Self {
        Self {
            mode,
            slot: PendingIntent::None,
            table: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    /// Current single-slot intent (intent mode).
    pub fn pending_intent(&self) -> &PendingIntent {
        &self.slot
    }

    /// Number of requests awaiting a response (by-id mode).
    pub fn outstanding(&self) -> usize {
        self.table.len()
    }

    pub fn handle(&mut self, event: SessionEvent) -> Option<RoutedOutput> {
        match event {
            SessionEvent::SessionEstablished(session_id) => {
                Some(RoutedOutput::Session(session_id))
            }
            SessionEvent::Expect { id, intent } => {
                self.expect(id, intent);
                None
            }
            SessionEvent::Withdraw(id) => {
                self.withdraw(id);
                None
            }
            SessionEvent::Message(payload) => Some(self.route(payload)),
            SessionEvent::RawEvent(text) => Some(RoutedOutput::Raw(text)),
            SessionEvent::StreamClosed(reason) => Some(RoutedOutput::Closed(reason)),
        }
    }

    /// Declares what the response to request `id` means.
    pub fn expect(&mut self, id: RequestId, intent: PendingIntent) {
        match self.mode {
            RoutingMode::ById => {
                self.table.insert(id, intent);
            }
            RoutingMode::Intent => {
                if !intent.is_listing() {
                    return;
                }
                if self.slot != PendingIntent::None {
                    warn!(
                        request_id = id,
                        previous = ?self.slot,
                        "Overwriting pending intent before its response arrived"
                    );
                }
                self.slot = intent;
            }
        }
    }

    /// Drops the entry for a request whose delivery failed.
    ///
    /// The intent-mode slot is left alone: it is shared by every listing
    /// request and the next listing-shaped payload still consumes it.
    pub fn withdraw(&mut self, id: RequestId) {
        if self.mode == RoutingMode::ById && self.table.remove(&id).is_some() {
            debug!(request_id = id, "Withdrew intent for undelivered request");
        }
    }

    pub fn route(&mut self, payload: Value) -> RoutedOutput {
        match self.mode {
            RoutingMode::ById => self.route_by_id(payload),
            RoutingMode::Intent => self.route_by_intent(payload),
        }
    }

    fn route_by_intent(&mut self, payload: Value) -> RoutedOutput {
        if listed_tools(&payload).is_none() {
            return RoutedOutput::Payload(payload);
        }
        let intent = std::mem::take(&mut self.slot);
        apply_listing(None, intent, payload)
    }

    fn route_by_id(&mut self, payload: Value) -> RoutedOutput {
        match response_id(&payload) {
            Some(id) => match self.table.remove(&id) {
                Some(intent) => resolve(id, intent, payload),
                None => {
                    debug!(request_id = id, "Response for an unknown request id");
                    RoutedOutput::Payload(payload)
                }
            },
            None if listed_tools(&payload).is_some() => {
                let oldest_listing = self
                    .table
                    .iter()
                    .find(|(_, intent)| intent.is_listing())
                    .map(|(id, _)| *id);
                match oldest_listing.and_then(|id| self.table.remove(&id).map(|i| (id, i))) {
                    Some((id, intent)) => {
                        debug!(request_id = id, "Routing id-less listing by shape");
                        apply_listing(Some(id), intent, payload)
                    }
                    None => RoutedOutput::Payload(payload),
                }
            }
            None => RoutedOutput::Payload(payload),
        }
    }
}

fn resolve(id: RequestId, intent: PendingIntent, payload: Value) -> RoutedOutput {
    match intent {
        PendingIntent::ExpectToolResult(name) => RoutedOutput::ToolResult { id, name, payload },
        intent if intent.is_listing() && listed_tools(&payload).is_some() => {
            apply_listing(Some(id), intent, payload)
        }
        _ => RoutedOutput::Payload(payload),
    }
}

fn apply_listing(id: Option<RequestId>, intent: PendingIntent, payload: Value) -> RoutedOutput {
    let Some(tools) = listed_tools(&payload) else {
        return RoutedOutput::Payload(payload);
    };
    match intent {
        PendingIntent::ExpectToolNames => RoutedOutput::ToolNames {
            id,
            names: tools
                .iter()
                .map(|tool| tool_name(tool).unwrap_or("<unnamed>").to_string())
                .collect(),
        },
        PendingIntent::ExpectToolInfo(name) => RoutedOutput::ToolInfo {
            id,
            descriptor: find_tool(tools, &name).cloned(),
            name,
        },
        _ => RoutedOutput::Payload(payload),
    }
}

/// Correlator task: consumes session events until every sender is gone.
pub async fn run_correlator(
    mut correlator: Correlator,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
    outputs: mpsc::UnboundedSender<RoutedOutput>,
) {
    while let Some(event) = events.recv().await {
        if let Some(output) = correlator.handle(event) {
            if outputs.send(output).is_err() {
                debug!("Output receiver dropped; discarding routed event");
            }
        }
    }
    debug!(mode = %correlator.mode(), "Correlator stopped");
}

#[cfg(test)]
mod tests;
