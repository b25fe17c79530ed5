//! `imgdrop`: upload the images of a markdown vault to S3-compatible storage.

mod cli;
mod commands;
mod config;
mod host;
mod output;
mod session;
mod timing;
mod vault;

use anyhow::Result;
use clap::Parser as _;

use crate::cli::{Cli, Commands};
use crate::config::TomlSettingsStore;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    timing::init_tracing(cli.verbose, cli.timing);

    match cli.command {
        Commands::Upload { note, line, ch } => {
            let session = Session::open(&cli.vault, TomlSettingsStore::default_location()?).await?;
            commands::run_upload(&session, &note, line, ch).await
        }
        Commands::Drop { note, files } => {
            let session = Session::open(&cli.vault, TomlSettingsStore::default_location()?).await?;
            commands::run_drop(&session, &note, &files).await
        }
        Commands::Paste { note } => {
            let session = Session::open(&cli.vault, TomlSettingsStore::default_location()?).await?;
            commands::run_paste(&session, &note).await
        }
        Commands::Config { action } => {
            commands::run_config(&TomlSettingsStore::default_location()?, action)
        }
        Commands::Completions { shell } => {
            commands::generate_completions(shell);
            Ok(())
        }
    }
}
