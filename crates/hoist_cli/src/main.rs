//! Hoist CLI: creates cluster install assets and waits for the cluster to
//! bootstrap.
//!
//! `hoist create <target>` resolves the target's assets in the install
//! directory. `hoist create cluster` goes on to provision infrastructure, wait
//! for bootstrap to finish and tear the bootstrap machine down again.
//! `hoist wait-for bootstrap-complete` only waits.

#![warn(missing_docs)]

mod bootstrap;
mod create;
mod infra;
mod logging;
mod report;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use hoist_assets::Target;
use tokio_util::sync::CancellationToken;

/// Hoist: install a Kubernetes cluster from a directory of assets.
#[derive(Parser, Debug)]
#[command(name = "hoist", version, about = "Cluster installer")]
pub struct Cli {
    /// Install directory holding generated assets.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Path to a `hoist.toml` to use instead of the one in the install directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,hoist_sync=debug`. `RUST_LOG` wins.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a target and everything it depends on.
    Create {
        /// One of `install-config`, `manifests`, `ignition-configs`, `cluster`.
        target: Target,
    },
    /// Wait for a stage of the install to finish.
    #[command(subcommand)]
    WaitFor(WaitFor),
}

/// Stages `hoist wait-for` can wait on.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum WaitFor {
    /// Wait until the bootstrap control plane reports completion.
    BootstrapComplete,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => hoist_config::load_config_file(path)?,
        None => hoist_config::load_config(&cli.dir)?,
    };
    logging::init(cli.log_level.as_deref(), &config.log.level)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, stopping");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        Command::Create { target } => create::run(&cli.dir, target, &config, &cancel).await,
        Command::WaitFor(WaitFor::BootstrapComplete) => {
            bootstrap::wait(&cli.dir, &config.wait, &cancel).await?;
            tracing::info!("It is now safe to remove the bootstrap resources");
            Ok(())
        }
    }
}
