//! Reference data: courses, subject areas and their learning outcomes
//!
//! Two tables loaded once per session: course → subject area
//! ("Assignatura" / "Matèria") and subject area → outcome
//! ("Matèria" / "Codi RA" / description / classification). Both keep source
//! order, which drives the order of the form and of the persisted rows.

use anyhow::{Result, bail};
use log::warn;
use std::path::Path;

pub mod excel;

pub use excel::SheetData;

/// A taught unit belonging to exactly one subject area.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseRecord {
    pub course: String,
    pub subject_area: String,
}

/// A learning outcome ("RA") of a subject area.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub subject_area: String,
    pub code: String,
    pub description: String,
    pub classification: String,
}

/// Immutable reference data for one session.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<CourseRecord>,
    outcomes: Vec<OutcomeRecord>,
}

// Column name aliases of the source files, matched case-insensitively.
const COURSE_ALIASES: &[&str] = &["assignatura"];
const SUBJECT_ALIASES: &[&str] = &["matèria", "materia"];
const CODE_ALIASES: &[&str] = &["codi ra", "codi"];
const DESCRIPTION_ALIASES: &[&str] = &[
    "resultado de aprendizaje",
    "resultat d'aprenentatge",
    "descripció",
    "descripcion",
];
const CLASSIFICATION_ALIASES: &[&str] = &["clasificación", "classificació", "clasificacion"];

impl Catalog {
    /// Load both reference files. Any failure here is fatal to the session.
    pub fn load<P: AsRef<Path>>(courses_path: P, outcomes_path: P) -> Result<Self> {
        let courses = excel::read_first_sheet(&courses_path)?;
        let outcomes = excel::read_first_sheet(&outcomes_path)?;
        Self::from_sheets(&courses, &outcomes)
    }

    /// Build the catalog from already-read sheets, reconciling headers
    /// against the required column names.
    pub fn from_sheets(courses: &SheetData, outcomes: &SheetData) -> Result<Self> {
        let course_col = require_column(courses, "Assignatura", COURSE_ALIASES)?;
        let course_subject_col = require_column(courses, "Matèria", SUBJECT_ALIASES)?;

        let outcome_subject_col = require_column(outcomes, "Matèria", SUBJECT_ALIASES)?;
        let code_col = require_column(outcomes, "Codi RA", CODE_ALIASES)?;
        let description_col =
            require_column(outcomes, "Resultado de aprendizaje", DESCRIPTION_ALIASES)?;
        let classification_col =
            require_column(outcomes, "Clasificación", CLASSIFICATION_ALIASES)?;

        let mut catalog = Catalog::default();

        for (idx, row) in courses.rows.iter().enumerate() {
            let course = cell(row, course_col);
            let subject_area = cell(row, course_subject_col);
            if course.is_empty() && subject_area.is_empty() {
                continue;
            }
            if course.is_empty() || subject_area.is_empty() {
                warn!(
                    "Skipping incomplete course row {} in '{}'",
                    idx + 2,
                    courses.name
                );
                continue;
            }
            catalog.courses.push(CourseRecord {
                course,
                subject_area,
            });
        }

        for (idx, row) in outcomes.rows.iter().enumerate() {
            let subject_area = cell(row, outcome_subject_col);
            let code = cell(row, code_col);
            if subject_area.is_empty() && code.is_empty() {
                continue;
            }
            if subject_area.is_empty() || code.is_empty() {
                warn!(
                    "Skipping incomplete outcome row {} in '{}'",
                    idx + 2,
                    outcomes.name
                );
                continue;
            }
            catalog.outcomes.push(OutcomeRecord {
                subject_area,
                code,
                description: cell(row, description_col),
                classification: cell(row, classification_col),
            });
        }

        if catalog.courses.is_empty() {
            warn!("Course table '{}' has no usable rows", courses.name);
        }
        log::info!(
            "Loaded catalog: {} courses, {} outcomes",
            catalog.courses.len(),
            catalog.outcomes.len()
        );
        Ok(catalog)
    }

    /// Unique course names in source order.
    pub fn course_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.courses
            .iter()
            .filter(|c| seen.insert(c.course.as_str()))
            .map(|c| c.course.as_str())
            .collect()
    }

    /// The subject area a course belongs to (first matching row).
    pub fn subject_area_of(&self, course: &str) -> Option<&str> {
        self.courses
            .iter()
            .find(|c| c.course == course)
            .map(|c| c.subject_area.as_str())
    }

    /// Outcomes of a subject area, in source order.
    pub fn outcomes_for(&self, subject_area: &str) -> Vec<&OutcomeRecord> {
        self.outcomes
            .iter()
            .filter(|o| o.subject_area == subject_area)
            .collect()
    }

    /// Unique subject areas of the course table, in source order.
    pub fn subject_areas_of_courses(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.courses
            .iter()
            .filter(|c| seen.insert(c.subject_area.as_str()))
            .map(|c| c.subject_area.as_str())
            .collect()
    }

    /// Unique subject area names of the outcome table, in source order.
    pub fn subject_areas(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.outcomes
            .iter()
            .filter(|o| seen.insert(o.subject_area.as_str()))
            .map(|o| o.subject_area.as_str())
            .collect()
    }
}

fn cell(row: &[String], col: usize) -> String {
    row.get(col).map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Find a required column by its aliases, or fail naming the headers found.
fn require_column(sheet: &SheetData, canonical: &str, aliases: &[&str]) -> Result<usize> {
    let found = sheet.headers.iter().position(|h| {
        let lowered = h.trim().to_lowercase();
        aliases.iter().any(|a| lowered == *a)
    });
    match found {
        Some(idx) => Ok(idx),
        None => bail!(
            "Reference file '{}' is missing required column '{}' (found: {})",
            sheet.name,
            canonical,
            sheet.headers.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses_sheet() -> SheetData {
        SheetData {
            name: "Assignatures".into(),
            headers: vec!["Assignatura".into(), "Matèria".into()],
            rows: vec![
                vec!["Psicologia".into(), "Psicologia Evolutiva".into()],
                vec!["Didàctica I".into(), "Didàctica".into()],
                vec!["Didàctica II".into(), "Didàctica".into()],
                vec!["".into(), "".into()],
            ],
        }
    }

    fn outcomes_sheet() -> SheetData {
        SheetData {
            name: "RA".into(),
            headers: vec![
                "Matèria".into(),
                "Codi RA".into(),
                "Resultado de aprendizaje".into(),
                "Clasificación".into(),
            ],
            rows: vec![
                vec![
                    "Psicologia Evolutiva".into(),
                    "RA1".into(),
                    "Coneix les etapes del desenvolupament".into(),
                    "Bàsica".into(),
                ],
                vec![
                    "Psicologia Evolutiva".into(),
                    "RA3".into(),
                    "Analitza contextos educatius".into(),
                    "Bàsica".into(),
                ],
                vec![
                    "Didàctica".into(),
                    "RA2".into(),
                    "Dissenya seqüències didàctiques".into(),
                    "Específica".into(),
                ],
            ],
        }
    }

    #[test]
    fn builds_catalog_and_preserves_source_order() {
        let catalog = Catalog::from_sheets(&courses_sheet(), &outcomes_sheet()).unwrap();
        assert_eq!(
            catalog.course_names(),
            vec!["Psicologia", "Didàctica I", "Didàctica II"]
        );
        assert_eq!(catalog.subject_area_of("Didàctica II"), Some("Didàctica"));

        let ras: Vec<&str> = catalog
            .outcomes_for("Psicologia Evolutiva")
            .iter()
            .map(|o| o.code.as_str())
            .collect();
        assert_eq!(ras, vec!["RA1", "RA3"]);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let mut sheet = courses_sheet();
        sheet.headers = vec!["Assignatura".into(), "Grup".into()];
        let err = Catalog::from_sheets(&sheet, &outcomes_sheet()).unwrap_err();
        assert!(err.to_string().contains("Matèria"));
        assert!(err.to_string().contains("Grup"));
    }

    #[test]
    fn header_matching_is_case_insensitive_with_aliases() {
        let mut outcomes = outcomes_sheet();
        outcomes.headers = vec![
            "MATERIA".into(),
            "codi ra".into(),
            "Resultat d'aprenentatge".into(),
            "Classificació".into(),
        ];
        let catalog = Catalog::from_sheets(&courses_sheet(), &outcomes).unwrap();
        assert_eq!(catalog.outcomes_for("Didàctica").len(), 1);
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let mut sheet = courses_sheet();
        sheet.rows.push(vec!["Sense matèria".into(), "".into()]);
        let catalog = Catalog::from_sheets(&sheet, &outcomes_sheet()).unwrap();
        assert!(!catalog.course_names().contains(&"Sense matèria"));
    }

    #[test]
    fn course_with_unknown_subject_area_has_no_outcomes() {
        let mut courses = courses_sheet();
        courses.rows.push(vec!["Nova".into(), "Matèria Nova".into()]);
        let catalog = Catalog::from_sheets(&courses, &outcomes_sheet()).unwrap();
        assert_eq!(catalog.subject_area_of("Nova"), Some("Matèria Nova"));
        assert!(catalog.outcomes_for("Matèria Nova").is_empty());
    }
}
