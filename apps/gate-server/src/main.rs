#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod logging;
mod report;
mod server;
mod signals;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use access_gate::AccessGate;
use anyhow::{Context as _, Result};
use authn_resolver_sdk::AuthNResolverClient;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Gate Server - management endpoints behind a basic-auth access policy
#[derive(Parser)]
#[command(name = "gate-server")]
#[command(about = "Gate Server - management endpoints behind a basic-auth access policy")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration, print the effective settings and rule table, and exit
    Check,
    /// Print the access decision for each path and exit
    Decide {
        /// Request paths, e.g. `/actuator/health`
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (GATE__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose)?;

    logging::init(&config.logging, cli.verbose > 0)?;

    let service = static_authn_plugin::Service::from_config(&config.authn);
    let user_count = service.user_count();
    let authn: Arc<dyn AuthNResolverClient> = Arc::new(service);
    let gate = AccessGate::new(config.gate.clone(), authn).context("invalid gate configuration")?;

    // Dispatch subcommands (default: run)
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config, &gate).await,
        Commands::Check => {
            tracing::info!("Checking configuration...");
            println!("{}", report::check_report(&config, &gate, user_count));
            Ok(())
        }
        Commands::Decide { paths } => {
            for path in &paths {
                println!("{}", report::decision_line(&gate, path));
            }
            Ok(())
        }
    }
}

async fn run_server(config: &AppConfig, gate: &AccessGate) -> Result<()> {
    tracing::info!("Gate Server starting");

    let addr = config.server.socket_addr()?;
    let router = server::build_router(gate);

    let cancel = CancellationToken::new();
    signals::cancel_on_shutdown(cancel.clone());

    server::serve(addr, router, cancel).await?;
    tracing::info!("Gate Server stopped");
    Ok(())
}
