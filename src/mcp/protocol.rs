//! JSON-RPC envelopes and the few MCP payload shapes this client interprets.
//!
//! Tool descriptors stay opaque JSON; only their `name` field is read.

use rust_mcp_schema::{CallToolResult, ContentBlock, RpcError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Identifier assigned to each outbound request, starting at 1.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Parameters for `tools/call`: `{name, arguments}`.
pub fn call_tool_params(name: &str, arguments: Map<String, Value>) -> Value {
    serde_json::json!({
        "name": name,
        "arguments": arguments,
    })
}

/// Numeric id echoed by a response, if any.
///
/// Servers that stringify ids (`"3"`) are tolerated.
pub fn response_id(payload: &Value) -> Option<RequestId> {
    match payload.get("id")? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// The `result.tools` array of a `tools/list` response.
pub fn listed_tools(payload: &Value) -> Option<&Vec<Value>> {
    payload.get("result")?.get("tools")?.as_array()
}

pub fn tool_name(tool: &Value) -> Option<&str> {
    tool.get("name").and_then(Value::as_str)
}

/// Exact-name linear scan over a tool list.
pub fn find_tool<'a>(tools: &'a [Value], name: &str) -> Option<&'a Value> {
    tools.iter().find(|tool| tool_name(tool) == Some(name))
}

/// Parses a JSON-RPC `error` member when present.
pub fn rpc_error(payload: &Value) -> Option<RpcError> {
    let error = payload.get("error")?;
    serde_json::from_value(error.clone()).ok()
}

pub fn format_rpc_error(error: &RpcError) -> String {
    let mut output = format!("MCP error {}: {}", error.code, error.message);
    if let Some(data) = &error.data {
        let details = data
            .get("details")
            .and_then(|value| value.as_str())
            .map(|value| value.to_string())
            .or_else(|| data.as_str().map(|value| value.to_string()))
            .or_else(|| serde_json::to_string_pretty(data).ok());

        if let Some(details) = details {
            if !details.is_empty() {
                output.push('\n');
                output.push_str(&details);
            }
        }
    }
    output
}

/// Renders the `result` of a `tools/call` response for display.
///
/// Text content blocks are joined with newlines; anything that does not
/// decode as a call result falls back to pretty-printed JSON.
pub fn render_call_result(result: &Value) -> String {
    let decoded = serde_json::from_value::<CallToolResult>(result.clone()).ok();
    let text = decoded.map(|call| {
        call.content
            .iter()
            .map(content_block_to_string)
            .collect::<Vec<_>>()
            .join("\n")
    });

    match text {
        Some(text) if !text.trim().is_empty() => text,
        _ => pretty(result),
    }
}

pub fn call_result_is_error(result: &Value) -> bool {
    result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn content_block_to_string(block: &ContentBlock) -> String {
    match block {
        ContentBlock::TextContent(text) => text.text.clone(),
        _ => serde_json::to_string_pretty(block)
            .unwrap_or_else(|_| "Unsupported tool content.".to_string()),
    }
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
