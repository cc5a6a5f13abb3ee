//! `apix` -- command-line interface for the extension pipeline gateway.
//!
//! Provides subcommands for running the gateway, previewing and executing
//! a single request's pipeline, and inspecting configuration.
//!
//! # Usage
//!
//! ```text
//! apix serve --config apix.json
//! apix plan --method POST --uri /objects --data @payload.json
//! apix run --method POST --uri /objects --header content-type:application/json
//! apix config check
//! ```

mod commands;

use clap::{Parser, Subcommand};

/// apix -- extension pipeline gateway.
#[derive(Parser)]
#[command(name = "apix", about = "Extension pipeline gateway", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway.
    Serve(commands::serve::ServeArgs),

    /// Show the route and extension queue a request would get.
    Plan(commands::RequestArgs),

    /// Run one request through its pipeline against the live services.
    Run(commands::RequestArgs),

    /// Inspect the configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

/// Configuration subcommands.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Print the resolved configuration as JSON.
    Show {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Report configuration problems; fails when any is an error.
    Check {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args).await?,
        Commands::Plan(args) => commands::plan::run(args).await?,
        Commands::Run(args) => commands::run::run(args).await?,
        Commands::Config { action } => {
            let platform = apix_platform::NativePlatform::new();
            match action {
                ConfigCmd::Show { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::config_cmd::config_show(&cfg);
                }
                ConfigCmd::Check { config } => {
                    let cfg = commands::load_config(&platform, config.as_deref()).await?;
                    commands::config_cmd::config_check(&cfg)?;
                }
            }
        }
    }

    Ok(())
}
