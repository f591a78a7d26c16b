//! Long-lived SSE receive loop and event decoding.

use super::{apply_sse_request_headers, is_event_stream_content_type};
use crate::mcp::error::McpError;
use crate::mcp::events::SessionEvent;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Data prefix of the handshake event announcing the command endpoint.
pub const SESSION_BOOTSTRAP_PREFIX: &str = "/messages?sessionId=";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Chunks may split lines and events anywhere; events are emitted once their
/// terminating blank line has been seen.
#[derive(Default)]
pub struct SseEventDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseEventDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        self.drain(false)
    }

    /// Flushes a trailing line and any event left open by a closed stream.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let mut events = self.drain(true);
        self.dispatch(&mut events);
        events
    }

    fn drain(&mut self, flush: bool) -> Vec<SseEvent> {
        let mut events = Vec::new();
        let mut search_index = 0;

        while let Some(relative_pos) = self.buffer[search_index..].iter().position(|b| *b == b'\n')
        {
            let newline_index = search_index + relative_pos;
            let mut line_end = newline_index;
            if line_end > search_index && self.buffer[line_end - 1] == b'\r' {
                line_end -= 1;
            }

            let line = String::from_utf8_lossy(&self.buffer[search_index..line_end]).into_owned();
            self.process_line(&line, &mut events);
            search_index = newline_index + 1;
        }

        if flush {
            let rest = String::from_utf8_lossy(&self.buffer[search_index..]).into_owned();
            if !rest.trim().is_empty() {
                self.process_line(rest.trim_end_matches('\r'), &mut events);
            }
            self.buffer.clear();
        } else if search_index > 0 {
            self.buffer.drain(..search_index);
        }

        events
    }

    fn process_line(&mut self, line: &str, events: &mut Vec<SseEvent>) {
        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.trim().to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        let event = self.event.take();
        if self.data.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        events.push(SseEvent { event, data });
    }
}

/// Extracts the session id from a handshake event.
///
/// Accepts the relative form `/messages?sessionId=<id>` and an absolute
/// endpoint URL carrying the same query.
pub fn session_id_from_endpoint(data: &str) -> Option<String> {
    let data = data.trim();
    let start = if data.starts_with(SESSION_BOOTSTRAP_PREFIX) {
        0
    } else if data.starts_with("http://") || data.starts_with("https://") {
        data.find(SESSION_BOOTSTRAP_PREFIX)?
    } else {
        return None;
    };

    let value = &data[start + SESSION_BOOTSTRAP_PREFIX.len()..];
    let value = value.split('&').next().unwrap_or_default().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// What a single event's data means to the session client.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Bootstrap(String),
    Message(Value),
    Malformed(McpError),
}

pub fn classify_event_data(data: &str) -> InboundEvent {
    if let Some(session_id) = session_id_from_endpoint(data) {
        return InboundEvent::Bootstrap(session_id);
    }
    match serde_json::from_str::<Value>(data) {
        Ok(value) => InboundEvent::Message(value),
        Err(err) => InboundEvent::Malformed(McpError::MalformedPayload {
            raw: data.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Receive loop holding the SSE connection for the life of the client.
pub struct SseListener {
    pub client: reqwest::Client,
    pub url: String,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub session: watch::Sender<Option<String>>,
    pub stop: CancellationToken,
}

impl SseListener {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!(url = %self.url, "Connecting to SSE stream");
        let reason = self.listen().await;

        if let Some(reason) = &reason {
            error!(url = %self.url, error = %reason, "SSE stream failed");
        }
        self.session.send_replace(None);
        self.stop.cancel();
        let _ = self
            .events
            .send(SessionEvent::StreamClosed(reason.map(|err| err.to_string())));
        info!("SSE listener stopped.");
    }

    async fn listen(&self) -> Option<McpError> {
        let request = apply_sse_request_headers(self.client.get(&self.url));
        let response = tokio::select! {
            _ = self.stop.cancelled() => return None,
            response = request.send() => response,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => return Some(McpError::Connection(err.to_string())),
        };
        if !response.status().is_success() {
            return Some(McpError::Connection(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !is_event_stream_content_type(content_type) {
            warn!(content_type, "SSE endpoint did not declare text/event-stream");
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseEventDecoder::default();
        let mut session_published = false;

        loop {
            let chunk = tokio::select! {
                _ = self.stop.cancelled() => return None,
                chunk = stream.next() => chunk,
            };
            match chunk {
                Some(Ok(chunk)) => {
                    for event in decoder.push(&chunk) {
                        self.handle_event(event, &mut session_published);
                    }
                }
                Some(Err(err)) => return Some(McpError::Connection(err.to_string())),
                None => break,
            }
        }

        for event in decoder.finish() {
            self.handle_event(event, &mut session_published);
        }
        debug!(url = %self.url, "SSE stream ended");
        None
    }

    fn handle_event(&self, event: SseEvent, session_published: &mut bool) {
        if event.data.trim().is_empty() {
            return;
        }

        let forwarded = match classify_event_data(&event.data) {
            InboundEvent::Bootstrap(session_id) => {
                if *session_published {
                    warn!(session_id = %session_id, "Ignoring repeated session handshake");
                    return;
                }
                *session_published = true;
                info!(session_id = %session_id, "Session established");
                self.session.send_replace(Some(session_id.clone()));
                SessionEvent::SessionEstablished(session_id)
            }
            InboundEvent::Message(value) => SessionEvent::Message(value),
            InboundEvent::Malformed(err) => {
                debug!(event = ?event.event, error = %err, "Forwarding raw SSE event");
                SessionEvent::RawEvent(event.data)
            }
        };

        if self.events.send(forwarded).is_err() {
            debug!("Correlator channel closed; dropping SSE event");
        }
    }
}
