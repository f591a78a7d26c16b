use crate::mcp::protocol::RequestId;
use crate::mcp::router::PendingIntent;
use serde_json::Value;

/// Messages delivered to the correlator task.
///
/// The receive loop and the dispatcher both write to the same channel, so an
/// `Expect` enqueued before its POST is always seen before the response.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SessionEstablished(String),
    Expect {
        id: RequestId,
        intent: PendingIntent,
    },
    /// Request `id` was never delivered; no response will follow.
    Withdraw(RequestId),
    Message(Value),
    RawEvent(String),
    StreamClosed(Option<String>),
}
