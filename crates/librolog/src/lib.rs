//! `librolog`
//!
//! Command-line front end of LibroLog. Parses the command, opens the record store configured in
//! the environment and prints what the handler returns.
use crate::cli::Cli;
use crate::config::Config;
use crate::errors::Error;
use anyhow::Context as _;
use clap::Parser as _;
use librolog_core::calendar::today;
use librolog_core::store::RecordStore;
use std::io::{self, BufRead as _, Write as _};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Command-line definitions
mod cli;
/// Command handlers
mod commands;
/// Environment configuration
mod config;
/// Error types
mod errors;
/// Text output
mod render;

#[allow(
    clippy::missing_inline_in_public_items,
    reason = "Executed once per run, never across crate boundaries"
)]
#[allow(
    clippy::print_stderr,
    reason = "Tracing might not be available here if run_safe() failed before its initialization"
)]
#[must_use]
pub fn run() -> ExitCode {
    match run_safe() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("librolog: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output on stdout stays clean. `RUST_LOG` overrides the default
/// `warn` level; `log` records from the core crate are bridged into tracing.
fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("Unable to set global tracing subscriber")
}

#[allow(
    clippy::print_stderr,
    reason = "Prompt is interactive, stdout carries command output"
)]
fn confirm_on_stdin(question: &str) -> io::Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn run_safe() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let config = Config::from_env().with_data_file(cli.data_file);
    let enricher = config
        .enricher()
        .context("Failed to create enrichment client")?;
    if enricher.is_none() && cli.command.needs_enrichment() {
        return Err(Error::EnrichmentDisabled.into());
    }

    tracing::info!("Using records from {}", config.data_file.display());
    let mut store = RecordStore::open(config.storage());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let output = runtime.block_on(commands::execute(
        cli.command,
        &mut store,
        &enricher,
        today(),
        commands::Format::from_flag(cli.json),
        &mut confirm_on_stdin,
    ))?;

    println!("{output}");
    Ok(())
}
