use crate::error::ReportResult;
use crate::reference::{ContactHoursTable, TierTable};
use crate::table::{read_table, Table};
use crate::types::{RawRow, SectionRecord, ROSTER_REQUIRED, SEC_DIVISIONS};
use crate::util::{normalize_key, parse_f64_lenient};
use csv::StringRecord;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub blank_ids: usize,
    pub duplicates: usize,
    pub parse_errors: usize,
    pub contact_misses: usize,
    pub tier_misses: usize,
}

/// The uploaded roster with its original headers and cells. The division
/// extract writes these back untouched; everything else goes through `enrich`.
#[derive(Debug, Clone)]
pub struct Roster {
    pub table: Table,
}

impl Roster {
    pub fn headers(&self) -> &[String] {
        &self.table.headers
    }

    /// Original rows whose division matches `division` case-insensitively.
    pub fn rows_for_division<'a>(&'a self, division: &'a str) -> impl Iterator<Item = &'a Vec<String>> + 'a {
        let idx = self.table.column(SEC_DIVISIONS);
        let wanted = division.trim().to_lowercase();
        self.table.rows.iter().filter(move |row| match idx {
            Some(i) => row.get(i).map(|d| d.trim().to_lowercase() == wanted).unwrap_or(false),
            None => false,
        })
    }

    /// Typed view of every row; rows serde cannot map are counted and skipped.
    pub fn raw_rows(&self) -> (Vec<RawRow>, usize) {
        let headers = StringRecord::from(self.table.headers.clone());
        let mut rows = Vec::with_capacity(self.table.rows.len());
        let mut parse_errors = 0usize;
        for (idx, row) in self.table.rows.iter().enumerate() {
            let record = StringRecord::from(row.clone());
            match record.deserialize::<RawRow>(Some(&headers)) {
                Ok(r) => rows.push(r),
                Err(e) => {
                    warn!("roster line {}: {}", idx + 2, e);
                    parse_errors += 1;
                }
            }
        }
        (rows, parse_errors)
    }
}

pub fn read_roster(path: &Path) -> ReportResult<Roster> {
    let table = read_table(path)?;
    table.require(&ROSTER_REQUIRED)?;
    info!("Roster {}: {} rows", path.display(), table.rows.len());
    Ok(Roster { table })
}

/// Split a normalized section id into (course code, course prefix).
///
/// `ENG-101-01` gives `("ENG-101", "ENG")`. An id without `-` is its own
/// course code.
pub fn split_section_id(section_id: &str) -> (String, String) {
    let course_code = match section_id.rfind('-') {
        Some(pos) => section_id[..pos].to_string(),
        None => section_id.to_string(),
    };
    let course_prefix = course_code
        .split('-')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    (course_code, course_prefix)
}

pub fn enrich(
    raw_rows: &[RawRow],
    contact: &ContactHoursTable,
    tiers: &TierTable,
) -> (Vec<SectionRecord>, LoadReport) {
    let mut report = LoadReport { total_rows: raw_rows.len(), ..LoadReport::default() };
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(raw_rows.len());

    for row in raw_rows {
        let section_id = normalize_key(row.sec_name.as_deref().unwrap_or_default());
        if section_id.is_empty() {
            report.blank_ids += 1;
            continue;
        }
        if !seen.insert(section_id.clone()) {
            report.duplicates += 1;
            continue;
        }
        let (course_code, course_prefix) = split_section_id(&section_id);

        let (fte_count, contact_hours) = match contact.get(&section_id) {
            Some(entry) => (entry.fte_count, entry.contact_hours),
            None => {
                debug!("enrich: no contact-hour entry for {}", section_id);
                report.contact_misses += 1;
                (
                    parse_f64_lenient(row.fte_count.as_deref()),
                    parse_f64_lenient(row.contact_hours.as_deref()),
                )
            }
        };

        let tier_value = match tiers.lookup(&course_prefix, &course_code) {
            Some(v) => v,
            None => {
                debug!("enrich: no tier entry for {} ({})", course_prefix, course_code);
                report.tier_misses += 1;
                parse_f64_lenient(row.tier_value.as_deref())
            }
        };

        records.push(SectionRecord {
            section_id,
            course_code,
            course_prefix,
            division: trimmed(&row.sec_divisions),
            delivery_method: trimmed(&row.delivery_method),
            meeting_times: trimmed(&row.meeting_times),
            faculty_info: trimmed(&row.faculty_info),
            capacity: parse_f64_lenient(row.capacity.as_deref()),
            fte_count,
            contact_hours,
            tier_value,
        });
    }

    report.kept_rows = records.len();
    info!(
        "Enriched {} sections ({} without contact hours, {} without a tier)",
        report.kept_rows, report.contact_misses, report.tier_misses
    );
    if report.blank_ids > 0 {
        warn!("Skipped {} roster rows without a Sec Name", report.blank_ids);
    }
    if report.duplicates > 0 {
        warn!("Dropped {} duplicate sections", report.duplicates);
    }
    (records, report)
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}
