//! Parley terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! # Join the `demo` conversation on a local server
//! parley demo --name mina
//!
//! # Talk to a separate chat endpoint, long-polling only
//! PARLEY_ENDPOINT=https://chat.example.com parley demo --transport polling
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use parley_app::{Runtime, UserInput, ViewConfig};
use parley_cli::LineDriver;
use parley_client::{
    ClientConfig, ConnectionManager, TransportKind, history::HttpHistoryLoader,
    transport::NetworkConnector,
};
use parley_proto::Scope;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley feedback chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for Parley feedback conversations")]
#[command(version)]
struct Args {
    /// Conversation slug to open on start
    scope: Option<String>,

    /// Chat server base URL; defaults to the origin
    #[arg(long, env = "PARLEY_ENDPOINT")]
    endpoint: Option<String>,

    /// Page origin the history API is served from
    #[arg(long, env = "PARLEY_ORIGIN", default_value = "http://localhost:3000")]
    origin: String,

    /// Display name
    #[arg(short, long, env = "PARLEY_NAME", default_value = parley_app::DEFAULT_AUTHOR)]
    name: String,

    /// Transports to try, in order (websocket, polling)
    #[arg(long, value_delimiter = ',')]
    transport: Vec<TransportKind>,

    /// Seconds a message may go unechoed before it is marked failed
    #[arg(long, default_value = "10")]
    ack_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let endpoint = args.endpoint.as_deref().map(ClientConfig::parse_url).transpose()?;
    let mut config =
        ClientConfig::new(ClientConfig::parse_url(&args.origin)?).with_endpoint(endpoint);
    if !args.transport.is_empty() {
        config = config.with_transports(args.transport)?;
    }
    tracing::info!(endpoint = %config.base_url(), transports = ?config.transports, "starting");

    let loader = Arc::new(HttpHistoryLoader::new(config.clone()));
    let connections = Arc::new(ConnectionManager::new(config, NetworkConnector::new()));

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let mut driver = LineDriver::new(lines, std::io::stdout());
    if let Some(scope) = args.scope {
        driver.queue(UserInput::Open(Scope::new(scope)));
    }

    let view_config = ViewConfig {
        ack_timeout: Duration::from_secs(args.ack_timeout),
        default_author: args.name,
    };
    Runtime::new(driver, connections, loader, view_config).run().await?;

    Ok(())
}
