use anyhow::Result;
use clap::Parser;
use log::info;

use ra_cli::cli::{Cli, Commands};
use ra_cli::config::{self, Config};
use ra_cli::store::{MemoryStore, SheetsClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a per-run file so the interactive prompts stay clean.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("ra-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let cli = Cli::parse();
    info!("Starting ra-cli");

    let config = Config::load(cli.config.as_deref())?;

    // The store client is built once here and passed down; no globals.
    match &cli.command {
        Commands::Form(args) if args.dry_run => {
            let store = MemoryStore::new();
            store.seed_sheet(&config.store.summary_sheet);
            ra_cli::cli::commands::form::run(&config, &store, args).await?;
        }
        Commands::Form(args) => {
            let client = build_client(&cli, &config)?;
            ra_cli::cli::commands::form::run(&config, &client, args).await?;
        }
        Commands::Catalog(args) => {
            ra_cli::cli::commands::catalog::run(&config, args)?;
        }
        Commands::Status => {
            let client = build_client(&cli, &config)?;
            ra_cli::cli::commands::status::run(&config, &client).await?;
        }
    }

    Ok(())
}

fn build_client(cli: &Cli, config: &Config) -> Result<SheetsClient> {
    let token = config::resolve_api_token(cli.token.clone(), config.store.api_token.clone())?;
    SheetsClient::new(&config.store, token)
}
