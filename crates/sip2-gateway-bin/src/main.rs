//! SIP2 gateway - bridges self-service library terminals to the Okapi backend.

mod app;
mod handlers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sip2_config_and_utils::{init_logging, Config, Paths};

/// SIP2 gateway command-line interface.
#[derive(Parser)]
#[command(name = "sip2-gateway")]
#[command(about = "SIP2 gateway for self-service library terminals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files. Defaults to ~/.sip2-gateway
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Config file to use instead of <base-dir>/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Port terminals connect to. Overrides the config file.
    #[arg(short, long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway
    Start,
    /// Print the effective configuration and exit
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)?;
            config.apply_env(|name| std::env::var(name).ok());
            config
        }
        None => Config::load(&paths)?,
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.validate()?;

    init_logging(&config.log_level, config.log_format);

    match cli.command {
        Some(Commands::Start) | None => {
            tracing::info!(base_dir = %paths.base_dir().display(), "Using gateway directory");
            app::run_gateway(config).await?;
        }
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}
