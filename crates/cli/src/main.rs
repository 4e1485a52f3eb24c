// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sg - staged lockstep runner

mod commands;
mod error;
mod output;
mod work;

use clap::{CommandFactory, Parser, Subcommand};
use commands::{completions, run};
use error::CliError;
use sg_core::ConfigError;
use sg_engine::HostError;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "sg",
    version,
    about = "stagegate - runners and a jury advancing through stages in lockstep"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the staged lockstep
    Run(run::RunArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging();

    let result = match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Completions(args) => completions::run(args, Cli::command()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

fn describe(err: &anyhow::Error) -> CliError {
    if let Some(host) = err.downcast_ref::<HostError>() {
        CliError::from_host(host)
    } else if let Some(config) = err.downcast_ref::<ConfigError>() {
        CliError::from_config(config)
    } else {
        CliError::new(format!("{:#}", err))
    }
}

/// Diagnostics go to stderr so stdout stays clean for announcements and JSON
fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
