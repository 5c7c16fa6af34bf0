pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod text;

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use state::AppState;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ktail_lib=debug,info"
    } else {
        "ktail_lib=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::resolve(cli.db, cli.orders);
    debug!(
        db = %config.db_path.display(),
        orders = %config.orders_path.display(),
        "resolved data paths"
    );
    let state = AppState::open(&config)?;

    Ok(cli::execute(cli.command, &state, cli.json)?)
}
