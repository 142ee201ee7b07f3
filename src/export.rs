//! CSV export of a session's selections

use anyhow::{Context, Result};
use log::info;
use std::path::Path;

use crate::selection::SelectionEntry;

/// Serialize the entries as UTF-8 CSV: header row, one row per entry.
pub fn entries_to_csv(entries: &[SelectionEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(SelectionEntry::HEADER)
        .context("Failed to write CSV header")?;
    for entry in entries {
        writer
            .write_record(entry.to_row())
            .context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Write the export artifact to disk.
pub fn write_csv<P: AsRef<Path>>(entries: &[SelectionEntry], path: P) -> Result<()> {
    let path = path.as_ref();
    let csv = entries_to_csv(entries)?;
    std::fs::write(path, csv)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    info!("Exported {} entries to {}", entries.len(), path.display());
    Ok(())
}
