//! In-memory spreadsheet store
//!
//! Backs `--dry-run` sessions and the reconciler tests. Counts every store
//! call and supports two fault knobs: rejecting all sheet creation (forces
//! the title-collision path) and failing writes to a named sheet (forces
//! the partial-success path).

use async_trait::async_trait;
use std::sync::Mutex;

use super::{SpreadsheetStore, StoreError};

#[derive(Default)]
struct Inner {
    /// Sheets in creation order: (title, rows).
    sheets: Vec<(String, Vec<Vec<String>>)>,
    calls: usize,
    reject_new_sheets: bool,
    fail_writes_to: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create an empty sheet, e.g. to provoke a title collision.
    pub fn seed_sheet(&self, title: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.sheets.push((title.to_string(), Vec::new()));
    }

    /// Pre-create a sheet with rows, e.g. an existing summary.
    pub fn seed_rows(&self, title: &str, rows: Vec<Vec<String>>) {
        let mut inner = self.inner.lock().unwrap();
        inner.sheets.push((title.to_string(), rows));
    }

    /// Make every subsequent `add_sheet` fail with `SheetExists`.
    pub fn reject_new_sheets(&self) {
        self.inner.lock().unwrap().reject_new_sheets = true;
    }

    /// Make every subsequent write to `sheet` fail.
    pub fn fail_writes_to(&self, sheet: &str) {
        self.inner.lock().unwrap().fail_writes_to = Some(sheet.to_string());
    }

    /// Total store calls made so far.
    pub fn call_count(&self) -> usize {
        self.inner.lock().unwrap().calls
    }

    /// Sheet titles in creation order.
    pub fn sheet_titles(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.sheets.iter().map(|(t, _)| t.clone()).collect()
    }

    /// Rows of a sheet, if it exists.
    pub fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
        let inner = self.inner.lock().unwrap();
        inner
            .sheets
            .iter()
            .find(|(t, _)| t == title)
            .map(|(_, rows)| rows.clone())
    }
}

#[async_trait]
impl SpreadsheetStore for MemoryStore {
    async fn add_sheet(&self, title: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if inner.reject_new_sheets || inner.sheets.iter().any(|(t, _)| t == title) {
            return Err(StoreError::SheetExists(title.to_string()));
        }
        inner.sheets.push((title.to_string(), Vec::new()));
        Ok(())
    }

    async fn read_header(&self, sheet: &str) -> Result<Option<Vec<String>>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        let rows = sheet_rows(&inner, sheet)?;
        Ok(rows.first().cloned())
    }

    async fn row_count(&self, sheet: &str) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        Ok(sheet_rows(&inner, sheet)?.len())
    }

    async fn write_rows(
        &self,
        sheet: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls += 1;
        if inner.fail_writes_to.as_deref() == Some(sheet) {
            return Err(StoreError::Request {
                status: 500,
                message: format!("injected write failure on '{}'", sheet),
            });
        }
        let target = inner
            .sheets
            .iter_mut()
            .find(|(t, _)| t == sheet)
            .map(|(_, rows)| rows)
            .ok_or_else(|| StoreError::Request {
                status: 404,
                message: format!("no sheet named '{}'", sheet),
            })?;
        for (i, row) in rows.iter().enumerate() {
            let idx = start_row - 1 + i;
            while target.len() <= idx {
                target.push(Vec::new());
            }
            target[idx] = row.clone();
        }
        Ok(())
    }
}

fn sheet_rows<'a>(inner: &'a Inner, sheet: &str) -> Result<&'a Vec<Vec<String>>, StoreError> {
    inner
        .sheets
        .iter()
        .find(|(t, _)| t == sheet)
        .map(|(_, rows)| rows)
        .ok_or_else(|| StoreError::Request {
            status: 404,
            message: format!("no sheet named '{}'", sheet),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_sheet_rejects_duplicate_titles() {
        let store = MemoryStore::new();
        store.add_sheet("Full1").await.unwrap();
        let err = store.add_sheet("Full1").await.unwrap_err();
        assert!(matches!(err, StoreError::SheetExists(_)));
    }

    #[tokio::test]
    async fn write_rows_pads_to_start_row() {
        let store = MemoryStore::new();
        store.add_sheet("Full1").await.unwrap();
        store
            .write_rows("Full1", 3, &[vec!["a".into(), "b".into()]])
            .await
            .unwrap();
        let rows = store.rows("Full1").unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[2], vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn header_and_count_reflect_writes() {
        let store = MemoryStore::new();
        store.add_sheet("Full1").await.unwrap();
        assert_eq!(store.read_header("Full1").await.unwrap(), None);
        store
            .write_rows("Full1", 1, &[vec!["h".into()], vec!["r".into()]])
            .await
            .unwrap();
        assert_eq!(
            store.read_header("Full1").await.unwrap(),
            Some(vec!["h".to_string()])
        );
        assert_eq!(store.row_count("Full1").await.unwrap(), 2);
    }
}
