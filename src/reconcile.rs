//! Persistence reconciliation
//!
//! Maps one session's selections onto the two-tier spreadsheet store: a
//! fresh, uniquely named detail sheet per save, plus rows appended to the
//! long-lived summary sheet. The two writes are not transactional; a
//! failure after the detail write is a distinct partial-success outcome
//! because the professor's data is already durable.

use chrono::{DateTime, Utc};
use chrono_tz::Europe::Madrid;
use chrono_tz::Tz;
use log::{info, warn};
use rand::Rng;
use std::fmt;

use crate::selection::SelectionEntry;
use crate::store::{SpreadsheetStore, StoreError};

/// Result of a fully or partially successful save.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub detail_sheet: String,
    pub rows_written: usize,
    /// First summary row the entries landed on (1-based).
    pub summary_start_row: usize,
    /// The summary header no longer matches the current field set. The
    /// stored header is authoritative and is never rewritten.
    pub header_mismatch: bool,
}

#[derive(Debug, Clone)]
pub enum SaveError {
    /// Caller-side precondition failure. No store calls were made.
    Validation(String),
    /// Store unreachable or credentials rejected before anything durable
    /// was written.
    Connection(String),
    /// The derived title and its retry suffix both collided.
    DuplicateSheet(String),
    /// The detail sheet was created but its rows could not be written.
    DetailWrite { sheet: String, cause: String },
    /// Detail write succeeded; the summary append did not. Partial success:
    /// the data exists in the detail sheet, aggregation is stale.
    SummarySync { detail_sheet: String, cause: String },
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Validation(msg) => write!(f, "{}", msg),
            SaveError::Connection(msg) => write!(f, "connexió amb el full de càlcul fallida: {}", msg),
            SaveError::DuplicateSheet(title) => {
                write!(f, "el full '{}' ja existeix (segon intent)", title)
            }
            SaveError::DetailWrite { sheet, cause } => {
                write!(f, "no s'han pogut escriure les files al full '{}': {}", sheet, cause)
            }
            SaveError::SummarySync { detail_sheet, cause } => write!(
                f,
                "full de detall '{}' desat, però el resum no s'ha actualitzat: {}",
                detail_sheet, cause
            ),
        }
    }
}

impl std::error::Error for SaveError {}

/// Three-way save outcome for the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Full,
    Partial,
    Failed,
}

/// `(success, message)` shape the shell prints; it never aborts the
/// session on a persistence failure.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub outcome: SaveOutcome,
    pub message: String,
}

impl SaveReport {
    pub fn from_result(result: &Result<Confirmation, SaveError>) -> Self {
        match result {
            Ok(confirmation) => {
                let mut message = format!(
                    "Seleccions desades: full '{}' ({} files), resum actualitzat a partir de la fila {}",
                    confirmation.detail_sheet,
                    confirmation.rows_written,
                    confirmation.summary_start_row
                );
                if confirmation.header_mismatch {
                    message.push_str(" (capçalera del resum antiga, no s'ha reescrit)");
                }
                SaveReport {
                    outcome: SaveOutcome::Full,
                    message,
                }
            }
            Err(SaveError::SummarySync { detail_sheet, cause }) => SaveReport {
                outcome: SaveOutcome::Partial,
                message: format!(
                    "Les seleccions són al full '{}', però el resum no s'ha pogut actualitzar: {}",
                    detail_sheet, cause
                ),
            },
            Err(e) => SaveReport {
                outcome: SaveOutcome::Failed,
                message: format!("No s'ha pogut desar: {}", e),
            },
        }
    }

    pub fn success(&self) -> bool {
        self.outcome != SaveOutcome::Failed
    }
}

/// Current time in the fixed civil timezone used for sheet titles and
/// entry timestamps, regardless of where the process runs.
pub fn now_madrid() -> DateTime<Tz> {
    Utc::now().with_timezone(&Madrid)
}

/// Candidate detail sheet title: `{professor}_{YYYY-MM-DD_HH-MM}`.
pub fn sheet_title(professor: &str, stamp: &DateTime<Tz>) -> String {
    format!("{}_{}", professor.trim(), stamp.format("%Y-%m-%d_%H-%M"))
}

/// Timestamp stored in each entry row.
pub fn entry_timestamp(stamp: &DateTime<Tz>) -> String {
    stamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Persist one session's entries.
///
/// Creates the detail sheet (retrying the title once with a random suffix
/// on collision), bulk-writes header plus rows to it, then appends the same
/// rows to the summary sheet starting at the first unoccupied row. The
/// summary header is written only on the very first save and never
/// rewritten afterwards.
pub async fn save(
    store: &dyn SpreadsheetStore,
    summary_sheet: &str,
    entries: &[SelectionEntry],
    professor: &str,
    stamp: DateTime<Tz>,
) -> Result<Confirmation, SaveError> {
    let professor = professor.trim();
    if professor.is_empty() {
        return Err(SaveError::Validation(
            "El nom del professor/a és obligatori".to_string(),
        ));
    }
    if entries.is_empty() {
        return Err(SaveError::Validation(
            "No hi ha cap selecció per desar".to_string(),
        ));
    }

    // Step 1-2: derive the title, create the sheet, one retry on collision.
    let title = sheet_title(professor, &stamp);
    let detail_sheet = match store.add_sheet(&title).await {
        Ok(()) => title,
        Err(StoreError::SheetExists(_)) => {
            let suffix = rand::thread_rng().gen_range(1..=1000);
            let retry_title = format!("{}_{}", title, suffix);
            info!("Sheet '{}' exists, retrying as '{}'", title, retry_title);
            match store.add_sheet(&retry_title).await {
                Ok(()) => retry_title,
                Err(StoreError::SheetExists(_)) => {
                    return Err(SaveError::DuplicateSheet(retry_title));
                }
                Err(e) => return Err(pre_detail_failure(e)),
            }
        }
        Err(e) => return Err(pre_detail_failure(e)),
    };

    // Step 3: header + all entry rows as one bulk write.
    let mut detail_rows = Vec::with_capacity(entries.len() + 1);
    detail_rows.push(SelectionEntry::header_row());
    detail_rows.extend(entries.iter().map(SelectionEntry::to_row));
    store
        .write_rows(&detail_sheet, 1, &detail_rows)
        .await
        .map_err(|e| SaveError::DetailWrite {
            sheet: detail_sheet.clone(),
            cause: e.to_string(),
        })?;
    info!(
        "Wrote detail sheet '{}' ({} entries)",
        detail_sheet,
        entries.len()
    );

    // Step 4: summary append. From here on the detail data is durable, so
    // every failure is the partial-success outcome.
    let (summary_start_row, header_mismatch) = sync_summary(store, summary_sheet, entries)
        .await
        .map_err(|e| SaveError::SummarySync {
            detail_sheet: detail_sheet.clone(),
            cause: e.to_string(),
        })?;

    Ok(Confirmation {
        detail_sheet,
        rows_written: entries.len(),
        summary_start_row,
        header_mismatch,
    })
}

/// Append the entry rows to the summary sheet. Returns the first row the
/// entries occupy and whether the stored header diverged from the current
/// field set.
async fn sync_summary(
    store: &dyn SpreadsheetStore,
    summary_sheet: &str,
    entries: &[SelectionEntry],
) -> Result<(usize, bool), StoreError> {
    let rows: Vec<Vec<String>> = entries.iter().map(SelectionEntry::to_row).collect();

    match store.read_header(summary_sheet).await? {
        None => {
            // First-ever write fixes the header.
            let mut all = Vec::with_capacity(rows.len() + 1);
            all.push(SelectionEntry::header_row());
            all.extend(rows);
            store.write_rows(summary_sheet, 1, &all).await?;
            Ok((2, false))
        }
        Some(existing) => {
            let header_mismatch = existing != SelectionEntry::header_row();
            if header_mismatch {
                warn!(
                    "Summary header differs from current fields (stored: {:?}); keeping it",
                    existing
                );
            }
            let next_row = store.row_count(summary_sheet).await? + 1;
            store.write_rows(summary_sheet, next_row, &rows).await?;
            Ok((next_row, header_mismatch))
        }
    }
}

/// Store failures before anything durable exists collapse into the
/// connection category: the attempt failed, no partial state was created.
fn pre_detail_failure(e: StoreError) -> SaveError {
    match e {
        StoreError::SheetExists(title) => SaveError::DuplicateSheet(title),
        other => SaveError::Connection(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    const SUMMARY: &str = "Resum";

    fn stamp() -> DateTime<Tz> {
        Madrid.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    fn entry(course: &str, code: &str) -> SelectionEntry {
        SelectionEntry {
            professor: "A. Puig".into(),
            course: course.into(),
            subject_area: "Psicologia Evolutiva".into(),
            outcome_code: code.into(),
            classification: "Bàsica".into(),
            timestamp: entry_timestamp(&stamp()),
        }
    }

    fn summary_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_sheet(SUMMARY);
        store
    }

    #[tokio::test]
    async fn worked_example_full_success() {
        let store = summary_store();
        let entries = vec![entry("Psicologia", "RA3")];

        let confirmation = save(&store, SUMMARY, &entries, "A. Puig", stamp())
            .await
            .unwrap();

        assert_eq!(confirmation.detail_sheet, "A. Puig_2024-05-01_10-00");
        assert_eq!(confirmation.rows_written, 1);
        assert!(!confirmation.header_mismatch);

        let detail = store.rows("A. Puig_2024-05-01_10-00").unwrap();
        assert_eq!(detail.len(), 2);
        assert_eq!(detail[0], SelectionEntry::header_row());
        assert_eq!(detail[1][3], "RA3");

        // First-ever summary write fixes the header, entries start at row 2.
        assert_eq!(confirmation.summary_start_row, 2);
        let summary = store.rows(SUMMARY).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0], SelectionEntry::header_row());
    }

    #[tokio::test]
    async fn title_collision_retries_once_with_suffix() {
        let store = summary_store();
        store.seed_sheet("A. Puig_2024-05-01_10-00");

        let confirmation = save(&store, SUMMARY, &[entry("Psicologia", "RA3")], "A. Puig", stamp())
            .await
            .unwrap();

        let suffix = confirmation
            .detail_sheet
            .strip_prefix("A. Puig_2024-05-01_10-00_")
            .expect("retry title keeps the base name");
        let n: u32 = suffix.parse().unwrap();
        assert!((1..=1000).contains(&n));

        // Both titles exist; nothing was overwritten.
        let titles = store.sheet_titles();
        assert!(titles.contains(&"A. Puig_2024-05-01_10-00".to_string()));
        assert!(titles.contains(&confirmation.detail_sheet));
    }

    #[tokio::test]
    async fn second_collision_surfaces_duplicate_sheet() {
        let store = summary_store();
        store.reject_new_sheets();

        let err = save(&store, SUMMARY, &[entry("Psicologia", "RA3")], "A. Puig", stamp())
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::DuplicateSheet(_)));
        // Exactly two creation attempts: the original and the single retry.
        assert_eq!(store.call_count(), 2);
    }

    #[tokio::test]
    async fn summary_failure_is_partial_success() {
        let store = summary_store();
        store.fail_writes_to(SUMMARY);

        let result = save(&store, SUMMARY, &[entry("Psicologia", "RA3")], "A. Puig", stamp()).await;
        let err = result.clone().unwrap_err();
        match &err {
            SaveError::SummarySync { detail_sheet, .. } => {
                // The detail data is durable despite the failure.
                let detail = store.rows(detail_sheet).unwrap();
                assert_eq!(detail.len(), 2);
            }
            other => panic!("expected SummarySync, got {:?}", other),
        }

        let report = SaveReport::from_result(&result);
        assert_eq!(report.outcome, SaveOutcome::Partial);
        assert!(report.success());
    }

    #[tokio::test]
    async fn summary_header_is_never_rewritten() {
        let store = MemoryStore::new();
        let old_header = vec!["Assignatura".to_string(), "Codi RA".to_string()];
        store.seed_rows(SUMMARY, vec![old_header.clone()]);

        let confirmation = save(&store, SUMMARY, &[entry("Psicologia", "RA3")], "A. Puig", stamp())
            .await
            .unwrap();

        assert!(confirmation.header_mismatch);
        let summary = store.rows(SUMMARY).unwrap();
        assert_eq!(summary[0], old_header);
        assert_eq!(summary.len(), 2);
    }

    #[tokio::test]
    async fn appending_n_rows_to_r_existing_gives_r_plus_n() {
        let store = MemoryStore::new();
        let mut seeded = vec![SelectionEntry::header_row()];
        seeded.push(entry("Psicologia", "RA1").to_row());
        seeded.push(entry("Psicologia", "RA2").to_row());
        store.seed_rows(SUMMARY, seeded);

        let entries = vec![entry("Psicologia", "RA3"), entry("Psicologia", "RA4")];
        let confirmation = save(&store, SUMMARY, &entries, "A. Puig", stamp())
            .await
            .unwrap();

        assert_eq!(confirmation.summary_start_row, 4);
        let summary = store.rows(SUMMARY).unwrap();
        assert_eq!(summary.len(), 5);
        assert_eq!(summary[0], SelectionEntry::header_row());
        assert_eq!(summary[3][3], "RA3");
        assert_eq!(summary[4][3], "RA4");
    }

    #[tokio::test]
    async fn double_save_duplicates_by_design() {
        let store = summary_store();
        let entries = vec![entry("Psicologia", "RA3")];

        save(&store, SUMMARY, &entries, "A. Puig", stamp()).await.unwrap();
        let later = Madrid.with_ymd_and_hms(2024, 5, 1, 10, 1, 0).unwrap();
        save(&store, SUMMARY, &entries, "A. Puig", later).await.unwrap();

        // Two detail sheets and two sets of summary rows.
        assert_eq!(store.sheet_titles().len(), 3);
        let summary = store.rows(SUMMARY).unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[1][3], "RA3");
        assert_eq!(summary[2][3], "RA3");
    }

    #[tokio::test]
    async fn same_minute_double_save_stays_unique_via_retry() {
        let store = summary_store();
        let entries = vec![entry("Psicologia", "RA3")];

        let first = save(&store, SUMMARY, &entries, "A. Puig", stamp()).await.unwrap();
        let second = save(&store, SUMMARY, &entries, "A. Puig", stamp()).await.unwrap();

        assert_ne!(first.detail_sheet, second.detail_sheet);
        assert!(second.detail_sheet.starts_with(&first.detail_sheet));
    }

    #[tokio::test]
    async fn missing_professor_makes_zero_store_calls() {
        let store = summary_store();
        let err = save(&store, SUMMARY, &[entry("Psicologia", "RA3")], "   ", stamp())
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::Validation(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_entries_make_zero_store_calls() {
        let store = summary_store();
        let err = save(&store, SUMMARY, &[], "A. Puig", stamp()).await.unwrap_err();
        assert!(matches!(err, SaveError::Validation(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn title_format_matches_example() {
        assert_eq!(sheet_title("A. Puig", &stamp()), "A. Puig_2024-05-01_10-00");
        assert_eq!(entry_timestamp(&stamp()), "2024-05-01 10:00:00");
    }
}
