//! Print the loaded reference data

use anyhow::Result;
use colored::*;

use crate::catalog::Catalog;
use crate::cli::app::{CatalogArgs, CatalogCommands};
use crate::config::Config;

pub fn run(config: &Config, args: &CatalogArgs) -> Result<()> {
    let catalog = Catalog::load(&config.catalog.courses_file, &config.catalog.outcomes_file)?;

    match &args.command {
        CatalogCommands::Courses => print_courses(&catalog),
        CatalogCommands::Outcomes { materia } => print_outcomes(&catalog, materia.as_deref()),
    }
    Ok(())
}

fn print_courses(catalog: &Catalog) {
    println!();
    for subject_area in catalog.subject_areas_of_courses() {
        println!("  {}", subject_area.bright_blue().bold());
        for course in catalog.course_names() {
            if catalog.subject_area_of(course) == Some(subject_area) {
                println!("    {}", course);
            }
        }
    }
    println!();
    println!("  {} assignatures", catalog.course_names().len());
}

fn print_outcomes(catalog: &Catalog, materia: Option<&str>) {
    println!();
    for subject_area in catalog.subject_areas() {
        if let Some(wanted) = materia {
            if !subject_area.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        println!("  {}", subject_area.bright_blue().bold());
        for outcome in catalog.outcomes_for(subject_area) {
            println!(
                "    {} {} {}",
                outcome.code.bright_green().bold(),
                outcome.description,
                format!("({})", outcome.classification).dimmed()
            );
        }
    }
}
