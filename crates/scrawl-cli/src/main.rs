//! Scrawl CLI - jot short notes into your account from the terminal
//!
//! Every note command signs in through the stored session first, then talks
//! to the backend directly.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod drafts;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "scrawl=warn";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Add { text }) => run_add(&text, profile).await?,
        Some(Commands::List { json }) => run_list(json, profile).await?,
        Some(Commands::Edit { id, text }) => run_edit(&id, &text, profile).await?,
        Some(Commands::Delete { id, yes }) => run_delete(&id, yes, profile).await?,
        Some(Commands::Auth { command }) => run_auth(command, profile).await?,
        Some(Commands::Config { command }) => run_config(command, profile)?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None if !cli.note.is_empty() => run_add(&cli.note, profile).await?,
        None => Cli::command().print_help()?,
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
