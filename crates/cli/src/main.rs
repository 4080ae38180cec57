//! ChatArbor CLI — the main entry point.
//!
//! Commands:
//! - `serve`  — Start the HTTP gateway
//! - `config` — Print the effective configuration

use clap::{Parser, Subcommand};
use tracing::info;

use chatarbor_config::AppConfig;

#[derive(Parser)]
#[command(
    name = "chatarbor",
    about = "ChatArbor — a knowledge-grounded support assistant service",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration (API key redacted)
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins; --verbose sets the fallback level.
    let fallback = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = AppConfig::load()?;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if !config.has_api_key() {
                return Err(
                    "No API key configured — set api.api_key in config.toml or CHATARBOR_API_KEY"
                        .into(),
                );
            }
            info!(model = %config.api.model, "Starting ChatArbor gateway");
            chatarbor_gateway::start(config).await?;
        }
        Commands::Config => {
            let config = AppConfig::load()?;
            println!("{config:#?}");
        }
    }

    Ok(())
}
