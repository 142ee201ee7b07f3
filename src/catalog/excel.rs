//! Excel reading for the reference data files

use anyhow::{Result, anyhow};
use calamine::{Reader, Xlsx, open_workbook};
use std::path::Path;

/// One worksheet as strings: header row plus data rows.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Read the first worksheet of an xlsx file.
pub fn read_first_sheet<P: AsRef<Path>>(path: P) -> Result<SheetData> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| anyhow!("Failed to open '{}': {}", path.display(), e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("'{}' contains no sheets", path.display()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| anyhow!("Error reading sheet '{}': {}", sheet_name, e))?;

    let mut headers = Vec::new();
    let mut rows = Vec::new();
    for (row_idx, row) in range.rows().enumerate() {
        let values: Vec<String> = row.iter().map(|cell| cell.to_string().trim().to_string()).collect();
        if row_idx == 0 {
            headers = values;
        } else {
            rows.push(values);
        }
    }

    Ok(SheetData {
        name: sheet_name,
        headers,
        rows,
    })
}

impl SheetData {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
