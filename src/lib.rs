//! Terminal client for MCP servers that speak JSON-RPC 2.0 over Server-Sent
//! Events.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`mcp`] owns the session: the SSE receive loop, the command dispatcher
//!   and the correlator that matches responses to the commands that caused
//!   them.
//! - [`core`] holds configuration loading, persistence and resolution.
//! - [`cli`] parses arguments and drives the interactive shell or the
//!   one-shot subcommands.
//! - [`utils`] provides logging setup and URL helpers.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod cli;
pub mod core;
pub mod mcp;
pub mod utils;
