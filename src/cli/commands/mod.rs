//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod config_cmd;
mod fetch;
mod prefetch;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use watchwarm::config::{load_settings_with_options, LoadOptions};
use watchwarm::prefetch::{ContentKey, Priority};

#[derive(Parser)]
#[command(name = "watchwarm")]
#[command(about = "Cache warming for the watchlist app")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL with retries and backoff, printing status and body
    Fetch {
        /// URL to fetch
        url: String,
        /// Retries after the first attempt (default: config max_retries)
        #[arg(short, long)]
        retries: Option<u32>,
        /// Per-attempt timeout in seconds (default: config request_timeout_secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Warm detail pages for content keys (e.g. movie:10 tv:4) and wait for the queue to drain
    Prefetch {
        /// Content keys as type:id
        #[arg(required = true)]
        keys: Vec<ContentKey>,
        /// Priority for every key
        #[arg(short, long, default_value = "low")]
        priority: Priority,
        /// Application base URL (overrides config)
        #[arg(long, env = "WATCHWARM_BASE_URL")]
        base_url: Option<String>,
    },

    /// Start the prefetch control API with periodic cache maintenance
    Serve {
        /// Host to bind to (default: from config listen address)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: from config listen address)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved settings as TOML
    Show,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
    };
    let settings = load_settings_with_options(options).await?;

    match cli.command {
        Commands::Fetch {
            url,
            retries,
            timeout,
        } => fetch::cmd_fetch(&settings, &url, retries, timeout).await,
        Commands::Prefetch {
            keys,
            priority,
            base_url,
        } => prefetch::cmd_prefetch(&settings, keys, priority, base_url.as_deref()).await,
        Commands::Serve { host, port } => {
            serve::cmd_serve(&settings, host.as_deref(), port).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&settings),
        },
    }
}
