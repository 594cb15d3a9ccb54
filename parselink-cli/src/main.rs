//! parselink command-line client.
//!
//! Usage:
//!   parselink --server http://localhost:1337/parse --app-id myApp login cooldude6 p_n7!-e8
//!   parselink --session-token r:... me
//!   parselink fetch Post --where '{"title":"hello"}'
//!
//! Without flags the server comes from PARSE_SERVER_URL, PARSE_APP_ID and
//! PARSE_REST_API_KEY.

use anyhow::{Context, Result};
use clap::Parser;
use parselink_cli::{Args, resolve_config, run};
use parselink_sync::{HttpTransport, Transport};
use std::sync::Arc;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = resolve_config(&args, |key| std::env::var(key).ok())?;
    debug!(server = config.server_url(), app_id = config.app_id(), "configured");

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(&config).context("failed to build HTTP transport")?);
    let output = run(&args, Arc::new(config), transport).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
