//! Command-line interface parsing and handling
//!
//! Without a subcommand the interactive shell starts. The one-shot
//! subcommands connect, wait for the session, send a single command and
//! print the response correlated with it.

pub mod settings;
pub mod shell;

use std::error::Error;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::cli::settings::{SettingError, SettingRegistry};
use crate::core::config::data::{path_display, Config};
use crate::core::config::settings::{Overrides, Settings};
use crate::core::constants::{ONE_SHOT_SESSION_TIMEOUT, RESPONSE_TIMEOUT};
use crate::mcp::client::{await_answer, McpClientOptions, McpSessionClient};
use crate::mcp::error::McpError;
use crate::mcp::router::{RoutedOutput, RoutingMode};
use crate::mcp::transport::{build_mcp_http_client, health_url};
use crate::utils::logging::init_tracing;

const GIT_SHA: &str = env!("VERGEN_GIT_SHA");
const BUILD_DATE: &str = env!("VERGEN_BUILD_DATE");

#[derive(Parser, Debug)]
#[command(name = "icd-mcp", version)]
#[command(about = "Terminal client for MCP servers speaking JSON-RPC over SSE")]
#[command(
    long_about = "icd-mcp opens the server's SSE stream, waits for the session endpoint, \
and sends JSON-RPC commands to it. Responses arrive on the stream and are matched \
to the command that caused them.\n\n\
Environment Variables:\n\
  MCP_SERVER_URL    Server base URL (default http://localhost:3000)\n\
  MCP_ROUTING       Response routing: by-id (default) or intent\n\
  LOG_LEVEL         Diagnostic log level (default info)\n\
  RUST_LOG          Full tracing filter; overrides LOG_LEVEL"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the MCP server
    #[arg(long, global = true, value_name = "URL")]
    pub server_url: Option<String>,

    /// How responses are matched to commands: by-id or intent
    #[arg(long, global = true, value_name = "MODE")]
    pub routing: Option<RoutingMode>,

    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the interactive menu (default)
    Shell,
    /// List all tools with their full descriptors
    Tools,
    /// List just the tool names
    Names,
    /// Show the descriptor of one tool
    Info {
        /// Exact tool name
        name: String,
    },
    /// Execute a tool
    Call {
        /// Exact tool name
        name: String,
        /// Arguments as a JSON object; omitted means `{}`
        arguments: Option<String>,
    },
    /// Probe the server's health endpoint
    Health,
    /// Show or change persisted configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommand {
    /// Print every key with its current value
    Show,
    /// Set a configuration value
    Set {
        /// One of server-url, log-level, routing, session-timeout
        key: String,
        value: String,
    },
    /// Unset a configuration value
    Unset {
        key: String,
    },
}

/// A single command sent by the one-shot subcommands.
#[derive(Debug, Clone, PartialEq)]
pub enum OneShot {
    ListTools,
    ListNames,
    ToolInfo(String),
    CallTool(String, Map<String, Value>),
}

impl OneShot {
    /// Maps a subcommand onto the request it sends, validating tool
    /// arguments locally. Returns `Ok(None)` for subcommands that are not
    /// one-shot requests.
    pub fn from_command(command: &Commands) -> Result<Option<Self>, McpError> {
        Ok(Some(match command {
            Commands::Tools => OneShot::ListTools,
            Commands::Names => OneShot::ListNames,
            Commands::Info { name } => OneShot::ToolInfo(name.clone()),
            Commands::Call { name, arguments } => OneShot::CallTool(
                name.clone(),
                shell::parse_tool_arguments(arguments.as_deref().unwrap_or_default())?,
            ),
            _ => return Ok(None),
        }))
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Commands::Shell);

    if let Commands::Config { action } = command {
        return run_config(action);
    }
    let one_shot = OneShot::from_command(&command)?;

    let config = Config::load()?;
    let settings = Settings::from_process_env(
        &config,
        Overrides {
            server_url: args.server_url,
            log_level: args.log_level,
            routing: args.routing,
        },
    );
    init_tracing(&settings.log_level);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_sha = GIT_SHA,
        build_date = BUILD_DATE,
        server_url = %settings.server_url,
        routing = %settings.routing,
        "Starting icd-mcp"
    );

    match (command, one_shot) {
        (Commands::Health, _) => run_health(&settings).await,
        (_, Some(request)) => run_one_shot(request, &settings).await,
        _ => run_interactive(&settings).await,
    }
}

fn client_options(settings: &Settings) -> McpClientOptions {
    McpClientOptions {
        base_url: settings.server_url.clone(),
        routing: settings.routing,
    }
}

async fn run_interactive(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let (client, mut outputs) = McpSessionClient::connect(client_options(settings))?;

    let printer = tokio::spawn(async move {
        while let Some(output) = outputs.recv().await {
            println!("\n{output}");
        }
    });

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = shell::run_shell(
        client.dispatcher(),
        stdin,
        &mut stdout,
        settings.session_timeout,
    )
    .await;

    client.shutdown().await;
    if let Err(err) = printer.await {
        debug!(error = %err, "Output printer ended abnormally");
    }
    result
}

async fn run_one_shot(request: OneShot, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let (client, mut outputs) = McpSessionClient::connect(client_options(settings))?;
    let session_timeout = settings.session_timeout.unwrap_or(ONE_SHOT_SESSION_TIMEOUT);

    let answer = async {
        client.wait_for_session(Some(session_timeout)).await?;
        let id = match request {
            OneShot::ListTools => client.list_tools().await?,
            OneShot::ListNames => client.list_tool_names().await?,
            OneShot::ToolInfo(name) => client.show_tool_info(&name).await?,
            OneShot::CallTool(name, arguments) => client.call_tool(&name, arguments).await?,
        };
        await_answer(&mut outputs, id, RESPONSE_TIMEOUT, |other| {
            if let RoutedOutput::Session(session_id) = other {
                debug!(session_id = %session_id, "Session established");
            } else {
                println!("{other}\n");
            }
        })
        .await
    }
    .await;

    client.shutdown().await;
    println!("{}", answer?);
    Ok(())
}

async fn run_health(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let client = build_mcp_http_client()?;
    let url = health_url(&settings.server_url);
    debug!(url = %url, "Probing health endpoint");
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|err| McpError::Http(err.to_string()))?;
    println!("Health check: HTTP {}", response.status().as_u16());
    Ok(())
}

fn run_config(action: Option<ConfigCommand>) -> Result<(), Box<dyn Error>> {
    let registry = SettingRegistry::new();
    let mut config = Config::load()?;

    let message = match action.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            println!("{}", registry.format_all(&config));
            if let Ok(path) = Config::get_config_path() {
                println!("  (file: {})", path_display(path));
            }
            return Ok(());
        }
        ConfigCommand::Set { key, value } => registry.set(&key, &value, &mut config)?,
        ConfigCommand::Unset { key } => registry.unset(&key, &mut config)?,
    };

    config
        .save()
        .map_err(|err| SettingError::ConfigError(err.to_string()))?;
    println!("{message}");
    Ok(())
}

#[cfg(test)]
mod tests;
