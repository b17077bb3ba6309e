//! The two static lookup tables behind the FTE formula.

use crate::error::{ReportError, ReportResult};
use crate::table::{cell, read_table, Table};
use crate::types::{CONTACT_HOURS, FTE_COUNT, SEC_NAME};
use crate::util::{normalize_key, parse_f64_lenient};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

pub const TIER_KEY: &str = "Prefix/Course ID";
pub const TIER_VALUE_COLUMN: &str = "New Sector";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEntry {
    pub fte_count: f64,
    pub contact_hours: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ContactHoursTable {
    entries: HashMap<String, ContactEntry>,
}

impl ContactHoursTable {
    pub fn get(&self, section_id: &str) -> Option<ContactEntry> {
        self.entries.get(&normalize_key(section_id)).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ContactEntry)> for ContactHoursTable {
    fn from_iter<I: IntoIterator<Item = (String, ContactEntry)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (k, v) in iter {
            entries.entry(normalize_key(&k)).or_insert(v);
        }
        ContactHoursTable { entries }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TierTable {
    entries: HashMap<String, f64>,
}

impl TierTable {
    /// Prefix match first, then the full course id.
    pub fn lookup(&self, course_prefix: &str, course_code: &str) -> Option<f64> {
        self.entries
            .get(&normalize_key(course_prefix))
            .or_else(|| self.entries.get(&normalize_key(course_code)))
            .copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, f64)> for TierTable {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut entries = HashMap::new();
        for (k, v) in iter {
            entries.entry(normalize_key(&k)).or_insert(v);
        }
        TierTable { entries }
    }
}

pub fn load_contact_hours(path: &Path) -> ReportResult<ContactHoursTable> {
    let table = read_table(path)?;
    let idx = require_reference_columns(&table, &[SEC_NAME, FTE_COUNT, CONTACT_HOURS])?;
    let (name_idx, fte_idx, hours_idx) = (idx[0], idx[1], idx[2]);

    let mut entries: HashMap<String, ContactEntry> = HashMap::new();
    let mut duplicates = 0usize;
    for row in &table.rows {
        let key = normalize_key(cell(row, name_idx));
        if key.is_empty() {
            continue;
        }
        let entry = ContactEntry {
            fte_count: parse_f64_lenient(Some(cell(row, fte_idx))),
            contact_hours: parse_f64_lenient(Some(cell(row, hours_idx))),
        };
        if entries.contains_key(&key) {
            duplicates += 1;
            continue;
        }
        entries.insert(key, entry);
    }
    if duplicates > 0 {
        warn!("{}: ignored {} duplicate section rows", path.display(), duplicates);
    }
    info!("Loaded {} contact-hour entries from {}", entries.len(), path.display());
    Ok(ContactHoursTable { entries })
}

pub fn load_tier_table(path: &Path) -> ReportResult<TierTable> {
    let table = read_table(path)?;
    let idx = require_reference_columns(&table, &[TIER_KEY, TIER_VALUE_COLUMN])?;

    let mut entries: HashMap<String, f64> = HashMap::new();
    for row in &table.rows {
        let key = normalize_key(cell(row, idx[0]));
        if key.is_empty() {
            continue;
        }
        let value = parse_f64_lenient(Some(cell(row, idx[1])));
        entries.entry(key).or_insert(value);
    }
    info!("Loaded {} tier entries from {}", entries.len(), path.display());
    Ok(TierTable { entries })
}

// Without these columns the FTE formula is meaningless, so a malformed
// reference file is a configuration problem rather than a roster one.
fn require_reference_columns(table: &Table, columns: &[&str]) -> ReportResult<Vec<usize>> {
    table.require(columns).map_err(|err| match err {
        ReportError::Validation { path, missing } => ReportError::Configuration {
            path,
            reason: format!("missing columns: {}", missing.join(", ")),
        },
        other => other,
    })
}
