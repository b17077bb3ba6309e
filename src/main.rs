// Entry point and high-level CLI flow.
//
// Each invocation runs one report end to end:
// - resolve the input files from flags, `--config` and defaults,
// - load the reference tables and the roster, then enrich the sections,
// - build every workbook in memory, then write them and print a preview.
mod aggregate;
mod config;
mod error;
mod fte;
mod loader;
mod output;
mod reference;
mod reports;
mod table;
mod types;
mod util;

use clap::Parser;
use config::{Cli, Command, ListTarget, Settings};
use error::ReportResult;
use loader::Roster;
use log::{debug, warn};
use reports::{FilterColumn, ReportBook};
use std::path::PathBuf;
use std::process::ExitCode;
use types::{RunSummary, SectionRecord};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Load both reference tables and join them onto the roster.
fn load_sections(settings: &Settings, roster: &Roster) -> ReportResult<Vec<SectionRecord>> {
    let contact = reference::load_contact_hours(&settings.contact_hours)?;
    let tiers = reference::load_tier_table(&settings.tiers)?;
    if contact.is_empty() || tiers.is_empty() {
        warn!("a reference table is empty; every section falls back to roster values");
    }
    let (raw, parse_errors) = roster.raw_rows();
    let (records, mut load_report) = loader::enrich(&raw, &contact, &tiers);
    load_report.parse_errors = parse_errors;

    println!(
        "Processing roster... ({} rows loaded, {} sections kept)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.kept_rows)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            util::format_int(load_report.parse_errors)
        );
    }
    debug!("load report: {:?}", load_report);
    Ok(records)
}

fn print_list(records: &[SectionRecord], what: ListTarget) {
    let column = match what {
        ListTarget::Divisions => FilterColumn::Divisions,
        ListTarget::Courses => FilterColumn::Courses,
        ListTarget::Instructors => FilterColumn::Instructors,
    };
    for value in reports::available_values(records, column) {
        println!("{}", value);
    }
}

fn filter_of(command: &Command) -> String {
    match command {
        Command::Divisions { selection } => selection.clone(),
        Command::Enrollment { course } | Command::FteCourse { course } => course.clone(),
        Command::FteDivision { division } => division.clone(),
        Command::FteInstructor { name } => name.clone(),
        Command::List { what } => format!("{:?}", what),
    }
}

fn build_books(cli: &Cli, settings: &Settings, roster: &Roster) -> ReportResult<Vec<ReportBook>> {
    let books = match &cli.command {
        Command::Divisions { selection } => reports::division_extract(roster, selection)?,
        Command::Enrollment { course } => {
            reports::course_enrollment(&load_sections(settings, roster)?, course)?
        }
        Command::FteDivision { division } => {
            reports::fte_by_division(&load_sections(settings, roster)?, division)?
        }
        Command::FteInstructor { name } => {
            vec![reports::fte_per_instructor(&load_sections(settings, roster)?, name)?]
        }
        Command::FteCourse { course } => {
            reports::fte_per_course(&load_sections(settings, roster)?, course)?
        }
        Command::List { what } => {
            print_list(&load_sections(settings, roster)?, *what);
            Vec::new()
        }
    };
    Ok(books)
}

fn run(cli: &Cli) -> ReportResult<Vec<PathBuf>> {
    let settings = Settings::resolve(cli)?;
    debug!("settings: {:?}", settings);
    let roster = loader::read_roster(&settings.roster)?;
    let books = build_books(cli, &settings, &roster)?;
    if books.is_empty() {
        return Ok(Vec::new());
    }

    let mut written = Vec::with_capacity(books.len());
    for book in &books {
        let path = output::write_workbook(&settings.out_dir, book)?;
        println!("\n{}: {} ({} sections)", book.kind, book.filter, util::format_int(book.sections));
        if let Some(sheet) = book.sheets.first() {
            println!("{}", output::preview_sheet(sheet, cli.preview_rows));
        }
        if !book.top.is_empty() {
            output::preview_table("Top 10 by Generated FTE", &book.top);
        }
        println!("(Full report exported to {})", path.display());
        written.push(path);
    }

    if let Some(summary_path) = &cli.summary {
        let summary = RunSummary {
            report: books[0].kind.to_string(),
            filter: filter_of(&cli.command),
            files: written.iter().map(|p| p.display().to_string()).collect(),
            sections: books.iter().map(|b| b.sections).sum(),
            total_generated_fte: util::round_to(books.iter().map(|b| b.total_generated_fte).sum(), 2),
            generated_at: chrono::Local::now(),
        };
        output::write_json(summary_path, &summary)?;
        println!("Summary written to {}", summary_path.display());
    }
    Ok(written)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
