// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! smsrcs - SMPP to RCS bridge.
//!
//! This is the binary entry point for the bridge.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smsrcs_config::BridgeConfig;

/// smsrcs - SMPP to RCS bridge.
#[derive(Parser, Debug)]
#[command(name = "smsrcs", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the SMPP and webhook listeners (default).
    Serve,
    /// Validate configuration and exit.
    CheckConfig,
}

fn load_config(path: Option<&PathBuf>) -> BridgeConfig {
    let loaded = match path {
        Some(path) => smsrcs_config::load_and_validate_path(path),
        None => smsrcs_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            smsrcs_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = smsrcs::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            println!(
                "smsrcs: config OK (smpp={}:{}, webhook={}:{}, bot_id={})",
                config.smpp.host,
                config.smpp.port,
                config.webhook.host,
                config.webhook.port,
                config.maap.bot_id
            );
        }
    }
}
