use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ra-cli")]
#[command(about = "Collect and persist learning-outcome (RA) selections per instructor")]
pub struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API token for the spreadsheet store (overrides env and config file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive selection form
    Form(FormArgs),
    /// Inspect the loaded reference data
    Catalog(CatalogArgs),
    /// Check that the spreadsheet store is reachable
    Status,
}

#[derive(Args)]
pub struct FormArgs {
    /// Show full outcome descriptions instead of truncating them
    #[arg(long)]
    pub full_descriptions: bool,

    /// Write the session CSV to this path after saving
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Run the save against an in-memory store; no remote calls
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: CatalogCommands,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List courses grouped by subject area
    Courses,
    /// List learning outcomes, optionally for one subject area
    Outcomes {
        #[arg(long)]
        materia: Option<String>,
    },
}
