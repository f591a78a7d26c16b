//! Interactive menu over an established MCP session.

use crate::mcp::dispatch::CommandDispatcher;
use crate::mcp::error::McpError;
use crate::mcp::protocol::RequestId;
use serde_json::{Map, Value};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

const MENU: &str = "\n--- Available Actions ---\n\
1. List all tools with full info\n\
2. List just the tool names\n\
3. Show detailed info for one tool\n\
4. Execute a tool\n\
5. Exit";

/// Parses the arguments typed for a tool call.
///
/// Blank input means no arguments; anything else must be a JSON object.
pub fn parse_tool_arguments(input: &str) -> Result<Map<String, Value>, McpError> {
    if input.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(_) => Err(McpError::InvalidUserInput(
            "Parameters must be a JSON object.".to_string(),
        )),
        Err(_) => Err(McpError::InvalidUserInput(
            "Invalid JSON format for parameters. Please try again.".to_string(),
        )),
    }
}

async fn prompt<R, W>(
    lines: &mut Lines<R>,
    out: &mut W,
    message: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    write!(out, "{message}")?;
    out.flush()?;
    Ok(lines.next_line().await?)
}

fn report<W: Write>(
    out: &mut W,
    method: &str,
    result: Result<RequestId, McpError>,
) -> std::io::Result<()> {
    match result {
        Ok(id) => writeln!(out, "Command '{method}' sent (request {id})."),
        Err(err) => writeln!(out, "Error: {err}"),
    }
}

/// Runs the menu loop until the user exits or input ends.
///
/// Waits for the session first; if the listener stops before a session
/// exists the shell returns without showing the menu. Losing the stream
/// later keeps the menu running, and commands then fail as not ready.
pub async fn run_shell<R, W>(
    dispatcher: &CommandDispatcher,
    input: R,
    out: &mut W,
    session_timeout: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "Connecting to SSE stream...")?;
    out.flush()?;
    if let Err(err) = dispatcher.session().wait_established(session_timeout).await {
        writeln!(out, "Failed to establish session ({err}). Exiting.")?;
        return Ok(());
    }

    let mut lines = input.lines();
    loop {
        writeln!(out, "{MENU}")?;
        let Some(choice) = prompt(&mut lines, out, "Enter your choice (1-5): ").await? else {
            break;
        };

        match choice.trim() {
            "1" => report(out, "tools/list", dispatcher.list_tools().await)?,
            "2" => {
                writeln!(out, "Requesting tool names...")?;
                report(out, "tools/list", dispatcher.list_tool_names().await)?;
            }
            "3" => {
                let Some(name) = prompt(
                    &mut lines,
                    out,
                    "Enter the tool name (e.g., 'list_applications'): ",
                )
                .await?
                else {
                    break;
                };
                let name = name.trim();
                if name.is_empty() {
                    writeln!(out, "Tool name cannot be empty.")?;
                    continue;
                }
                writeln!(out, "Requesting info for tool: {name}")?;
                report(out, "tools/list", dispatcher.show_tool_info(name).await)?;
            }
            "4" => {
                let Some(name) = prompt(&mut lines, out, "Enter the tool name to execute: ").await?
                else {
                    break;
                };
                let Some(params) = prompt(
                    &mut lines,
                    out,
                    "Enter parameters as a JSON string (e.g., '{\"namespace\": \"default\"}'): ",
                )
                .await?
                else {
                    break;
                };
                let name = name.trim();
                if name.is_empty() {
                    writeln!(out, "Tool name cannot be empty.")?;
                    continue;
                }
                let arguments = match parse_tool_arguments(&params) {
                    Ok(arguments) => arguments,
                    Err(err) => {
                        writeln!(out, "{err}")?;
                        continue;
                    }
                };
                if params.trim().is_empty() {
                    writeln!(out, "No parameters provided, using empty parameters.")?;
                }
                report(out, "tools/call", dispatcher.call_tool(name, arguments).await)?;
            }
            "5" => {
                writeln!(out, "Exiting...")?;
                dispatcher.session().stop();
                break;
            }
            _ => writeln!(out, "Invalid choice. Please try again.")?,
        }
    }

    out.flush()?;
    Ok(())
}
