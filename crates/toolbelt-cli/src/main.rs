//! Toolbelt CLI - invoke the agent toolbelt from the command line
#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser as _;
use cli::{Cli, Commands};

mod cli;
mod handlers;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (config, fallback) = handlers::load_config(cli.config.as_deref())?;
    handlers::init_logging(&config.logging);
    handlers::report_config_fallback(fallback);

    match cli.command {
        Commands::Tools => handlers::handle_tools(&config),
        Commands::Call { name, args } => {
            handlers::enter_project(&cli.project)?;
            handlers::handle_call(&config, &name, &args).await
        }
        Commands::Config => handlers::handle_config(&config),
    }
}
