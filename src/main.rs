//! MCP server for SD Elements surveys.
//!
//! Run with `SDE_HOST=https://sde.example.com SDE_API_KEY=... sde-mcp`.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sde_mcp::catalog::{AnswerCatalog, DEFAULT_PAGE_SIZE};
use sde_mcp::matcher::DEFAULT_FUZZY_THRESHOLD;
use sde_mcp::{McpServer, McpSession, SdeClient};

/// MCP server for SD Elements surveys.
///
/// Exposes survey answer matching and draft editing as MCP tools for AI agents.
/// Communicates via JSON-RPC 2.0 over stdin/stdout.
#[derive(Parser)]
#[command(name = "sde-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the SD Elements instance.
    #[arg(long, env = "SDE_HOST", value_name = "URL")]
    host: String,

    /// API token used for the `Authorization: Token` header.
    #[arg(long, env = "SDE_API_KEY", hide_env_values = true)]
    api_key: String,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "SDE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Default similarity threshold for fuzzy answer matching (0.0 to 1.0).
    #[arg(long, env = "SDE_FUZZY_THRESHOLD", default_value_t = DEFAULT_FUZZY_THRESHOLD, value_parser = parse_threshold)]
    fuzzy_threshold: f64,

    /// Page size used when loading the answer library.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    catalog_page_size: usize,

    /// Load the answer library on first use instead of at startup.
    #[arg(long)]
    no_preload: bool,

    /// Enable debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&t) {
        Ok(t)
    } else {
        Err("must be between 0.0 and 1.0".to_string())
    }
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the protocol.
    let default_level = if args.verbose { "sde_mcp=debug" } else { "sde_mcp=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let client = match SdeClient::new(&args.host, &args.api_key, Duration::from_secs(args.timeout_secs)) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: Failed to create SD Elements client: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(base_url = client.base_url(), "using SD Elements API");

    // Create session and server
    let session = McpSession::new(client)
        .with_catalog(AnswerCatalog::new(args.catalog_page_size))
        .with_fuzzy_threshold(args.fuzzy_threshold);

    // A failed preload is logged by the catalog and leaves it empty.
    if !args.no_preload {
        session.reload_catalog();
    }

    let server = McpServer::new(session);

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    // Run the server
    let result = runtime.block_on(server.run());
    drop(runtime);
    if let Err(e) = result {
        eprintln!("Error: Server error: {}", e);
        std::process::exit(1);
    }
}
