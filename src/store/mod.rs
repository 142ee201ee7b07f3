//! Spreadsheet store abstraction
//!
//! The remote store is a spreadsheet addressed by a fixed identifier and
//! reached over a credentialed HTTP API. The trait keeps the reconciler
//! independent of the transport so the save path can run against the
//! in-memory implementation (`--dry-run`, tests).

use async_trait::async_trait;
use std::fmt;

pub mod memory;
pub mod sheets;

pub use memory::MemoryStore;
pub use sheets::SheetsClient;

/// Errors surfaced by a spreadsheet store implementation.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Store unreachable or credentials rejected. Nothing was written.
    Connection(String),
    /// A sheet with the requested title already exists.
    SheetExists(String),
    /// Any other API rejection.
    Request { status: u16, message: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "store connection failed: {}", msg),
            StoreError::SheetExists(title) => write!(f, "sheet '{}' already exists", title),
            StoreError::Request { status, message } => {
                write!(f, "store request failed (HTTP {}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// A spreadsheet-like store: named sheets holding rows of cells.
///
/// Row numbers are 1-based throughout, matching the remote API's A1
/// addressing.
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    /// Create a new, empty sheet. Fails with [`StoreError::SheetExists`]
    /// if the title is taken.
    async fn add_sheet(&self, title: &str) -> Result<(), StoreError>;

    /// Read the first row of a sheet. `None` if the sheet is empty.
    async fn read_header(&self, sheet: &str) -> Result<Option<Vec<String>>, StoreError>;

    /// Number of occupied rows in a sheet.
    async fn row_count(&self, sheet: &str) -> Result<usize, StoreError>;

    /// Bulk-write `rows` starting at `start_row` (1-based).
    async fn write_rows(
        &self,
        sheet: &str,
        start_row: usize,
        rows: &[Vec<String>],
    ) -> Result<(), StoreError>;
}
