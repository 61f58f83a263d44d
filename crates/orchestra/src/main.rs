mod config;
mod logging;
mod players;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use log::{info, warn};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use config::{ConfigError, StageConfig};

/// Orchestra: run a stage of players from a description file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Print "pong" and exit
    #[arg(long)]
    ping: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Set up, play and clean the stage described in FILE
    Run {
        /// Stage description (.json, .yaml/.yml or .toml)
        file: PathBuf,
        /// Cancel the players after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Only set up and clean the stage, never play it
        #[arg(long)]
        dry_run: bool,
    },
    /// Parse FILE and print the stage tree without running anything
    Validate {
        /// Stage description (.json, .yaml/.yml or .toml)
        file: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stage(#[from] orchestra_core::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    if let Err(e) = logging::init() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let result = match args.command {
        Some(Commands::Run { file, timeout_secs, dry_run }) => {
            run(&file, timeout_secs.map(Duration::from_secs), dry_run).await
        }
        Some(Commands::Validate { file }) => validate(&file),
        None => {
            if let Err(e) = CliArgs::command().print_help() {
                warn!("Failed to print help: {}", e);
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn validate(file: &Path) -> Result<(), CliError> {
    let config = StageConfig::load(file)?;
    print!("{}", config.summary());
    println!("Stage description is valid.");
    Ok(())
}

async fn run(file: &Path, timeout: Option<Duration>, dry_run: bool) -> Result<(), CliError> {
    let config = StageConfig::load(file)?;
    let stage = config.build();

    println!("Setting up stage '{}'...", stage.name());
    // A failed setup has already cleaned whatever it had set up.
    stage.setup().await.map_err(orchestra_core::Error::from)?;

    if dry_run {
        println!("Dry run: skipping play.");
        stage.clean().await;
        println!("Stage '{}' cleaned.", stage.name());
        return Ok(());
    }

    let ctx = CancellationToken::new();
    let watcher = watch_for_cancel(ctx.clone(), timeout);

    println!("Playing stage '{}'...", stage.name());
    let outcome = stage.play(&ctx).await;
    watcher.abort();

    stage.clean().await;
    println!("Stage '{}' cleaned.", stage.name());

    outcome.map_err(orchestra_core::Error::from)?;
    println!("Stage '{}' finished successfully.", stage.name());
    Ok(())
}

/// Cancel `ctx` on ctrl-c, or once `timeout` elapses.
fn watch_for_cancel(ctx: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        tokio::select! {
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("Interrupt received, cancelling players"),
                Err(e) => {
                    warn!("Unable to listen for ctrl-c: {}", e);
                    (&mut deadline).await;
                    info!("Timeout reached, cancelling players");
                }
            },
            _ = &mut deadline => info!("Timeout reached, cancelling players"),
        }
        ctx.cancel();
    })
}

fn report(err: &CliError) {
    eprintln!("Error: {}", err);
    if let CliError::Stage(orchestra_core::Error::Play(play)) = err {
        for name in play.failed_players() {
            if let Some(player_err) = play.get(name) {
                eprintln!("  - {}: {}", name, player_err);
            }
        }
    }
}
