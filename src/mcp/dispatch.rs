//! Outbound JSON-RPC commands.
//!
//! Delivery is fire-and-forget: the POST response only acknowledges receipt
//! and the logical result arrives later on the SSE stream.

use crate::mcp::error::McpError;
use crate::mcp::events::SessionEvent;
use crate::mcp::protocol::{
    call_tool_params, JsonRpcRequest, RequestId, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use crate::mcp::router::PendingIntent;
use crate::mcp::session::SessionHandle;
use crate::mcp::transport::{apply_command_post_headers, messages_url};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Delivery seam for serialized commands.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Posts `request` to `url`, returning the acknowledgement body.
    async fn post(&self, url: &str, request: &JsonRpcRequest) -> Result<String, McpError>;
}

pub struct HttpCommandSink {
    client: reqwest::Client,
}

impl HttpCommandSink {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandSink for HttpCommandSink {
    async fn post(&self, url: &str, request: &JsonRpcRequest) -> Result<String, McpError> {
        let response = apply_command_post_headers(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|err| McpError::Http(err.to_string()))?;
        let status = response.status();
        let body = response.text().await;
        if !status.is_success() {
            let body = body.unwrap_or_else(|err| {
                debug!(error = %err, "Failed to read error response body");
                String::new()
            });
            return Err(McpError::Http(format!("HTTP {status}: {body}")));
        }
        body.map_err(|err| McpError::Http(format!("Failed to read acknowledgement: {err}")))
    }
}

pub struct CommandDispatcher {
    base_url: String,
    session: SessionHandle,
    sink: Arc<dyn CommandSink>,
    intents: mpsc::UnboundedSender<SessionEvent>,
    next_id: AtomicU64,
}

impl CommandDispatcher {
    pub fn new(
        base_url: impl Into<String>,
        session: SessionHandle,
        sink: Arc<dyn CommandSink>,
        intents: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            session,
            sink,
            intents,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Id the next accepted command will carry.
    pub fn next_request_id(&self) -> RequestId {
        self.next_id.load(Ordering::SeqCst)
    }

    pub async fn send(&self, method: &str, params: Value) -> Result<RequestId, McpError> {
        self.send_with_intent(method, params, PendingIntent::None)
            .await
    }

    /// Sends a command after declaring how its response should be routed.
    ///
    /// Rejected with [`McpError::SessionNotReady`] and no network traffic
    /// when no session exists. Otherwise the id is consumed even if the POST
    /// fails, and the declared intent is withdrawn again.
    pub async fn send_with_intent(
        &self,
        method: &str,
        params: Value,
        intent: PendingIntent,
    ) -> Result<RequestId, McpError> {
        let Some(session_id) = self.session.current() else {
            error!(method, "{}", McpError::SessionNotReady);
            return Err(McpError::SessionNotReady);
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if self
            .intents
            .send(SessionEvent::Expect { id, intent })
            .is_err()
        {
            debug!(request_id = id, "Correlator gone; response will not be routed");
        }

        let request = JsonRpcRequest::new(id, method, params);
        let url = messages_url(&self.base_url, &session_id);
        debug!(request_id = id, method, url = %url, "Sending MCP command");

        match self.sink.post(&url, &request).await {
            Ok(ack) => {
                info!(request_id = id, method, response = %ack, "Command sent successfully")
            }
            Err(err) => {
                error!(request_id = id, method, error = %err, "Command delivery failed");
                if self.intents.send(SessionEvent::Withdraw(id)).is_err() {
                    debug!(request_id = id, "Correlator gone; nothing to withdraw");
                }
            }
        }
        Ok(id)
    }

    /// `tools/list` with the payload printed as received.
    pub async fn list_tools(&self) -> Result<RequestId, McpError> {
        self.send(METHOD_TOOLS_LIST, Value::Object(Map::new()))
            .await
    }

    pub async fn list_tool_names(&self) -> Result<RequestId, McpError> {
        self.send_with_intent(
            METHOD_TOOLS_LIST,
            Value::Object(Map::new()),
            PendingIntent::ExpectToolNames,
        )
        .await
    }

    /// Lists tools and keeps only the descriptor named `name`.
    pub async fn show_tool_info(&self, name: &str) -> Result<RequestId, McpError> {
        self.send_with_intent(
            METHOD_TOOLS_LIST,
            Value::Object(Map::new()),
            PendingIntent::ExpectToolInfo(name.to_string()),
        )
        .await
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<RequestId, McpError> {
        self.send_with_intent(
            METHOD_TOOLS_CALL,
            call_tool_params(name, arguments),
            PendingIntent::ExpectToolResult(name.to_string()),
        )
        .await
    }
}
