//! The interactive selection form
//!
//! One session: pick courses, check the outcomes covered per course, give
//! a name, preview, save, optionally export. A failed or partial save
//! leaves the in-memory selections intact so the save can be retried.

use anyhow::{Result, bail};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect};
use log::info;

use crate::catalog::{Catalog, OutcomeRecord};
use crate::cli::app::FormArgs;
use crate::config::Config;
use crate::export;
use crate::reconcile::{self, SaveOutcome, SaveReport};
use crate::selection::{SelectionEntry, SelectionSet, collect_entries};
use crate::store::SpreadsheetStore;

const DESCRIPTION_PREVIEW_CHARS: usize = 100;

pub async fn run(config: &Config, store: &dyn SpreadsheetStore, args: &FormArgs) -> Result<()> {
    let catalog = Catalog::load(&config.catalog.courses_file, &config.catalog.outcomes_file)?;

    let course_names = catalog.course_names();
    if course_names.is_empty() {
        bail!("The course reference file has no usable rows");
    }

    println!();
    println!(
        "  {}",
        "Selecció de Resultats d'Aprenentatge per Professor/a"
            .bright_blue()
            .bold()
    );
    if args.dry_run {
        println!("  {}", "(dry-run: no s'escriurà res al full remot)".yellow());
    }
    println!();

    let selected_idx = MultiSelect::new()
        .with_prompt("Selecciona les assignatures que són responsabilitat teva")
        .items(&course_names)
        .interact()?;
    if selected_idx.is_empty() {
        println!("Cap assignatura seleccionada.");
        return Ok(());
    }
    let selected_courses: Vec<String> = selected_idx
        .into_iter()
        .map(|i| course_names[i].to_string())
        .collect();

    let mut picks = SelectionSet::new();
    for course in &selected_courses {
        let Some(subject_area) = catalog.subject_area_of(course) else {
            continue;
        };
        let outcomes = catalog.outcomes_for(subject_area);
        if outcomes.is_empty() {
            println!(
                "  {}",
                format!("'{}' ({}): cap RA definit", course, subject_area).dimmed()
            );
            continue;
        }
        let labels: Vec<String> = outcomes
            .iter()
            .map(|o| outcome_label(o, args.full_descriptions))
            .collect();
        let chosen = MultiSelect::new()
            .with_prompt(format!("RA que treballes a '{}' ({})", course, subject_area))
            .items(&labels)
            .interact()?;
        for i in chosen {
            picks.insert((course.clone(), outcomes[i].code.clone()));
        }
    }

    if picks.is_empty() {
        println!("Cap RA seleccionat.");
        return Ok(());
    }

    // Save loop. Selections survive failed attempts; every retry is an
    // explicit user action with a fresh timestamp.
    let mut session_entries: Vec<SelectionEntry> = Vec::new();
    loop {
        let professor: String = Input::new()
            .with_prompt("Nom del professor/a")
            .allow_empty(true)
            .interact_text()?;
        let stamp = reconcile::now_madrid();
        let entries = collect_entries(
            &catalog,
            &selected_courses,
            &picks,
            professor.trim(),
            &reconcile::entry_timestamp(&stamp),
        );
        print_preview(&entries);
        session_entries = entries;

        if !Confirm::new()
            .with_prompt("Desar les seleccions al full de càlcul?")
            .default(true)
            .interact()?
        {
            break;
        }

        let result = reconcile::save(
            store,
            &config.store.summary_sheet,
            &session_entries,
            &professor,
            stamp,
        )
        .await;
        let report = SaveReport::from_result(&result);
        match report.outcome {
            SaveOutcome::Full => {
                println!("  {}", report.message.green());
                break;
            }
            SaveOutcome::Partial => {
                println!("  {}", report.message.yellow());
                break;
            }
            SaveOutcome::Failed => {
                println!("  {}", report.message.red());
                if !Confirm::new()
                    .with_prompt("Tornar-ho a intentar?")
                    .default(true)
                    .interact()?
                {
                    break;
                }
            }
        }
    }

    offer_export(&session_entries, args)?;
    Ok(())
}

fn outcome_label(outcome: &OutcomeRecord, full_descriptions: bool) -> String {
    let description = if full_descriptions {
        outcome.description.clone()
    } else {
        truncate_chars(&outcome.description, DESCRIPTION_PREVIEW_CHARS)
    };
    format!("[{}] {}", outcome.code, description)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

fn print_preview(entries: &[SelectionEntry]) {
    println!();
    println!("  {}", "Seleccions de la sessió".bright_blue().bold());
    for entry in entries {
        println!(
            "  {} {} {} {}",
            entry.course.bright_white(),
            format!("({})", entry.subject_area).dimmed(),
            entry.outcome_code.bright_green().bold(),
            entry.classification.dimmed()
        );
    }
    println!("  {} entrades", entries.len());
    println!();
}

fn offer_export(entries: &[SelectionEntry], args: &FormArgs) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    if let Some(path) = &args.export {
        export::write_csv(entries, path)?;
        println!("  {}", format!("CSV exportat a {}", path.display()).green());
        return Ok(());
    }
    if Confirm::new()
        .with_prompt("Vols descarregar les seleccions en CSV?")
        .default(false)
        .interact()?
    {
        let path: String = Input::new()
            .with_prompt("Fitxer de destinació")
            .default("seleccio_RA_professor.csv".to_string())
            .interact_text()?;
        export::write_csv(entries, &path)?;
        info!("Session exported to {}", path);
        println!("  {}", format!("CSV exportat a {}", path).green());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "àèìòù".repeat(30);
        let label = truncate_chars(&text, 100);
        assert_eq!(label.chars().count(), 103); // 100 + "..."
        assert!(label.ends_with("..."));
    }

    #[test]
    fn short_descriptions_are_untouched() {
        assert_eq!(truncate_chars("Coneix les etapes", 100), "Coneix les etapes");
    }

    #[test]
    fn label_carries_the_code() {
        let outcome = OutcomeRecord {
            subject_area: "Didàctica".into(),
            code: "RA2".into(),
            description: "Dissenya seqüències didàctiques".into(),
            classification: "Específica".into(),
        };
        assert_eq!(
            outcome_label(&outcome, true),
            "[RA2] Dissenya seqüències didàctiques"
        );
    }
}
