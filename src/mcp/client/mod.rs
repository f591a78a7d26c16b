//! Owned session context wiring the receive loop, the correlator and the
//! dispatcher together.
//!
//! [`McpSessionClient::connect`] spawns two tasks: the SSE listener and the
//! correlator. The caller keeps the dispatcher side and receives correlated
//! results on the returned channel.

use crate::mcp::dispatch::{CommandDispatcher, CommandSink, HttpCommandSink};
use crate::mcp::error::McpError;
use crate::mcp::events::SessionEvent;
use crate::mcp::protocol::RequestId;
use crate::mcp::router::{run_correlator, Correlator, RoutedOutput, RoutingMode};
use crate::mcp::session::SessionHandle;
use crate::mcp::transport::sse::SseListener;
use crate::mcp::transport::{build_mcp_http_client, sse_url};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct McpClientOptions {
    pub base_url: String,
    pub routing: RoutingMode,
}

pub struct McpSessionClient {
    dispatcher: CommandDispatcher,
    listener: JoinHandle<()>,
    correlator: JoinHandle<()>,
}

impl McpSessionClient {
    /// Connects using a freshly built HTTP client for both the stream and
    /// the command endpoint.
    pub fn connect(
        options: McpClientOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RoutedOutput>), McpError> {
        let client = build_mcp_http_client()
            .map_err(|err| McpError::Connection(format!("Failed to build HTTP client: {err}")))?;
        let sink = Arc::new(HttpCommandSink::new(client.clone()));
        Ok(Self::connect_with_sink(options, client, sink))
    }

    pub fn connect_with_sink(
        options: McpClientOptions,
        client: reqwest::Client,
        sink: Arc<dyn CommandSink>,
    ) -> (Self, mpsc::UnboundedReceiver<RoutedOutput>) {
        let (session_tx, session_rx) = watch::channel(None);
        let stop = CancellationToken::new();
        let session = SessionHandle::new(session_rx, stop.clone());
        let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
        let (output_tx, output_rx) = mpsc::unbounded_channel();

        let correlator = tokio::spawn(run_correlator(
            Correlator::new(options.routing),
            event_rx,
            output_tx,
        ));
        let listener = SseListener {
            client,
            url: sse_url(&options.base_url),
            events: event_tx.clone(),
            session: session_tx,
            stop,
        }
        .spawn();
        let dispatcher = CommandDispatcher::new(options.base_url, session, sink, event_tx);

        (
            Self {
                dispatcher,
                listener,
                correlator,
            },
            output_rx,
        )
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn session(&self) -> &SessionHandle {
        self.dispatcher.session()
    }

    pub async fn wait_for_session(&self, timeout: Option<Duration>) -> Result<String, McpError> {
        self.session().wait_established(timeout).await
    }

    pub async fn list_tools(&self) -> Result<RequestId, McpError> {
        self.dispatcher.list_tools().await
    }

    pub async fn list_tool_names(&self) -> Result<RequestId, McpError> {
        self.dispatcher.list_tool_names().await
    }

    pub async fn show_tool_info(&self, name: &str) -> Result<RequestId, McpError> {
        self.dispatcher.show_tool_info(name).await
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<RequestId, McpError> {
        self.dispatcher.call_tool(name, arguments).await
    }

    /// Signals the listener to stop and waits for both tasks to finish.
    pub async fn shutdown(self) {
        let Self {
            dispatcher,
            listener,
            correlator,
        } = self;
        dispatcher.session().stop();
        drop(dispatcher);
        if let Err(err) = listener.await {
            debug!(error = %err, "SSE listener task ended abnormally");
        }
        if let Err(err) = correlator.await {
            debug!(error = %err, "Correlator task ended abnormally");
        }
    }
}

/// Waits for the routed output answering request `id`.
///
/// Unrelated outputs received meanwhile are handed to `on_other`.
pub async fn await_answer(
    outputs: &mut mpsc::UnboundedReceiver<RoutedOutput>,
    id: RequestId,
    timeout: Duration,
    mut on_other: impl FnMut(&RoutedOutput),
) -> Result<RoutedOutput, McpError> {
    let wait = async {
        while let Some(output) = outputs.recv().await {
            match output {
                output if output.answers(id) => return Ok(output),
                RoutedOutput::Closed(reason) => {
                    return Err(McpError::Connection(
                        reason.unwrap_or_else(|| "SSE stream closed".to_string()),
                    ))
                }
                other => on_other(&other),
            }
        }
        Err(McpError::Connection("correlator stopped".to_string()))
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| McpError::Timeout(format!("response to request {id}")))?
}
