mod api;
mod auth;
mod cli;
mod protocol;
mod relay;
mod router;
mod startup;
mod state;

use clap::Parser;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG and clap's env-backed args see it too.
    mammoth_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .init();

    let args = Cli::parse();
    let config = mammoth_core::Config::for_profile(args.profile.as_deref().unwrap_or(""));

    cli::dispatch(config, args.command.unwrap_or(Command::Serve)).await
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_filter_reads_rust_log_from_dotenv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "RUST_LOG=mammoth_server=trace").unwrap();
        dotenvy::from_path_override(file.path()).unwrap();

        assert_eq!(log_filter().to_string(), "mammoth_server=trace");
    }
}
