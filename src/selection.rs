//! Session selections
//!
//! The form only tracks which `(course, outcome code)` pairs are checked;
//! the entry sequence is re-derived from the catalog and that set every
//! time it is needed, so the result never drifts from the reference data.

use log::warn;
use std::collections::HashSet;

use crate::catalog::Catalog;

/// One marked outcome, ready to become a spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
    pub professor: String,
    pub course: String,
    pub subject_area: String,
    pub outcome_code: String,
    pub classification: String,
    pub timestamp: String,
}

impl SelectionEntry {
    /// Header row of every persisted table, in entry field order.
    pub const HEADER: [&'static str; 6] = [
        "Professor/a",
        "Assignatura",
        "Matèria",
        "Codi RA",
        "Clasificación",
        "Data",
    ];

    pub fn header_row() -> Vec<String> {
        Self::HEADER.iter().map(|h| h.to_string()).collect()
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.professor.clone(),
            self.course.clone(),
            self.subject_area.clone(),
            self.outcome_code.clone(),
            self.classification.clone(),
            self.timestamp.clone(),
        ]
    }
}

/// Checked `(course, outcome code)` pairs.
pub type SelectionSet = HashSet<(String, String)>;

/// Derive the ordered entry sequence for a session.
///
/// Order follows `selected_courses` (course-selection order), then outcome
/// source order within each course. Each pair appears at most once by
/// construction. The classification travels with the outcome row it was
/// loaded from, never from a neighbouring iteration.
pub fn collect_entries(
    catalog: &Catalog,
    selected_courses: &[String],
    picks: &SelectionSet,
    professor: &str,
    timestamp: &str,
) -> Vec<SelectionEntry> {
    let mut entries = Vec::new();
    for course in selected_courses {
        let Some(subject_area) = catalog.subject_area_of(course) else {
            warn!("Selected course '{}' is not in the catalog", course);
            continue;
        };
        for outcome in catalog.outcomes_for(subject_area) {
            if picks.contains(&(course.clone(), outcome.code.clone())) {
                entries.push(SelectionEntry {
                    professor: professor.to_string(),
                    course: course.clone(),
                    subject_area: subject_area.to_string(),
                    outcome_code: outcome.code.clone(),
                    classification: outcome.classification.clone(),
                    timestamp: timestamp.to_string(),
                });
            }
        }
    }
    entries
}
