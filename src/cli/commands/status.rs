//! Connectivity check against the spreadsheet store

use anyhow::Result;
use colored::*;

use crate::config::Config;
use crate::store::SpreadsheetStore;

pub async fn run(config: &Config, store: &dyn SpreadsheetStore) -> Result<()> {
    let summary = &config.store.summary_sheet;
    println!();
    match store.row_count(summary).await {
        Ok(rows) => {
            println!("  {}", "Store reachable".green().bold());
            println!(
                "  Summary sheet '{}' has {} occupied row{}",
                summary,
                rows,
                if rows == 1 { "" } else { "s" }
            );
            match store.read_header(summary).await {
                Ok(Some(header)) => println!("  Header: {}", header.join(", ").dimmed()),
                Ok(None) => println!("  {}", "Summary sheet is empty (header not yet fixed)".dimmed()),
                Err(e) => println!("  {}", format!("Could not read header: {}", e).yellow()),
            }
            Ok(())
        }
        Err(e) => {
            println!("  {}", "Store unreachable".red().bold());
            println!("  {}", e.to_string().red());
            anyhow::bail!("status check failed: {}", e)
        }
    }
}
