//! Signal Relay Server
//!
//! Run with: cargo run -- [--config FILE] [--host HOST] [--port PORT]
//!
//! # Configuration
//!
//! Settings come from, in increasing priority:
//! - built-in defaults
//! - the config file (`--config`, or the first of
//!   `~/.config/signal-relay/config.toml`, `/etc/signal-relay/config.toml`,
//!   `./config.toml`)
//! - `SIGNAL_RELAY_*` environment variables
//! - command-line flags
//!
//! `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use signal_relay::{
    generate_default_config, serve, AppState, Config, LoadReport, LoggingConfig,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "signal-relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Two-party rendezvous and signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay (default)
    Serve,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config { output }) = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("writing config to {}", path.display()))?;
                println!("Config written to {}", path.display());
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let (mut config, report) = match &cli.config {
        Some(path) => {
            let config = Config::load_with_env(path)?;
            let report = LoadReport {
                loaded_from: Some(path.clone()),
                ..LoadReport::default()
            };
            (config, report)
        }
        None => Config::load_default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);
    report.log();

    tracing::info!("Starting signal relay v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        address = %config.server.addr(),
        max_connections = config.server.max_connections,
        reap_empty = config.rooms.reap_empty,
        notify_room_full = config.rooms.notify_room_full,
        "Configuration loaded"
    );

    serve(AppState::new(config)).await?;

    tracing::info!("Signal relay stopped");
    Ok(())
}

/// Initialize the tracing subscriber from logging config
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("signal_relay={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
