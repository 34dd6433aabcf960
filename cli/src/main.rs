// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Diagram Service Daemon
//!
//! The `diagramd` binary serves the Generate / Fetch HTTP API.
//!
//! ## Commands
//!
//! - `diagramd serve` - Run the HTTP server (default when no command is given)
//! - `diagramd config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use diagram_service_core::domain::service_config::ServiceConfigManifest;

mod commands;
mod server;

use commands::ConfigCommand;

/// Diagram Service - token-gated diagram rendering
#[derive(Parser)]
#[command(name = "diagramd")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "DIAGRAMS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: from config, 8080)
    #[arg(long, global = true, env = "DIAGRAMS_PORT")]
    port: Option<u16>,

    /// HTTP API host (default: from config, 127.0.0.1)
    #[arg(long, global = true, env = "DIAGRAMS_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIAGRAMS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    #[command(name = "serve")]
    Serve,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config { command }) => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"), "compact")?;
            commands::config::handle_command(command, cli.config).await
        }
        Some(Commands::Serve) | None => {
            let mut config = ServiceConfigManifest::load_or_default(cli.config)
                .context("Failed to load configuration")?;

            let observability = &config.spec.observability;
            let level = cli
                .log_level
                .clone()
                .unwrap_or_else(|| observability.log_level.clone());
            init_logging(&level, &observability.log_format)?;

            config.validate().context("Configuration validation failed")?;

            if let Some(host) = cli.host {
                config.spec.server.bind_address = host;
            }
            if let Some(port) = cli.port {
                config.spec.server.port = port;
            }

            info!(name = %config.metadata.name, "Starting diagram service");
            server::start_server(config).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }

    Ok(())
}
