//! Merit CLI - Keep a merit/fault ledger from the command line
//!
//! Records are written locally first and synced to the backend when signed in.

mod cli;
mod commands;
mod error;
mod settings;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, StatsView};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::StoreOptions;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, EditArgs};
use crate::commands::health::run_health;
use crate::commands::list::{run_list, run_show};
use crate::commands::record::run_add;
use crate::commands::stats::run_stats;
use crate::commands::sync::run_sync;
use crate::error::CliError;

const DEFAULT_LOG_DIRECTIVE: &str = "merit=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
        )
        .init();

    let cli = Cli::parse();
    let options = StoreOptions::resolve(cli.db_path, cli.config, cli.ephemeral);

    match cli.command {
        Commands::Add { kind, score, note } => {
            run_add(kind.into(), score, note, &options).await?;
        }
        Commands::List { date, json } => run_list(date.as_deref(), json, &options).await?,
        Commands::Show { id, json } => run_show(&id, json, &options)?,
        Commands::Edit {
            id,
            kind,
            score,
            note,
            clear_note,
        } => {
            let args = EditArgs {
                kind: kind.map(Into::into),
                score,
                note,
                clear_note,
            };
            run_edit(&id, args, &options).await?;
        }
        Commands::Delete { id } => run_delete(&id, &options).await?,
        Commands::Stats { view, json } => {
            run_stats(view.unwrap_or(StatsView::Today), json, &options).await?;
        }
        Commands::Sync => run_sync(&options).await?,
        Commands::Health => run_health(&options).await?,
        Commands::Config { command } => run_config(command, &options)?,
        Commands::Auth { command } => run_auth(command, &options).await?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
