//! CLI argument parsing and subcommand dispatch.

use clap::{Parser, Subcommand};

use mammoth_core::Config;
use mammoth_storage::ProfileStore;

use crate::startup;

/// Chat relay for the AskMammoth Oracle.
#[derive(Parser, Debug)]
#[command(name = "mammoth-server", version, about = "Chat relay for the AskMammoth Oracle")]
pub struct Cli {
    /// Config profile; every key is looked up as `{PROFILE}_{KEY}` first
    #[arg(long, env = "MAMMOTH_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP + WebSocket server (default)
    Serve,
    /// Fetch one candidate profile from the configured store and print it
    Profile {
        /// Candidate first name, case-insensitive
        name: String,
    },
}

pub async fn dispatch(config: Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve => startup::serve(config).await,
        Command::Profile { name } => print_profile(&config, &name).await,
    }
}

async fn print_profile(config: &Config, name: &str) -> anyhow::Result<()> {
    let store = ProfileStore::from_config(&config.storage)?;
    match store.fetch(name).await? {
        Some(profile) => println!("{}", profile),
        None => anyhow::bail!(
            "no profile for '{}' in {} store",
            name,
            store.backend().label()
        ),
    }
    Ok(())
}
