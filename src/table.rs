//! Header + string rows read from either a CSV file or the first worksheet
//! of a spreadsheet. Every input of the report pipeline goes through here.

use crate::error::{ReportError, ReportResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Indices of `columns`, in the order asked for. Fails with every
    /// missing name at once.
    pub fn require(&self, columns: &[&str]) -> ReportResult<Vec<usize>> {
        let mut found = Vec::with_capacity(columns.len());
        let mut missing = Vec::new();
        for name in columns {
            match self.column(name) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(ReportError::Validation { path: self.source.clone(), missing })
        }
    }
}

/// Cell value at `idx`, empty when the row is short.
pub fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

pub fn read_table(path: &Path) -> ReportResult<Table> {
    if !path.is_file() {
        return Err(ReportError::configuration(path, "file not found"));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_spreadsheet(path)?,
        _ => read_csv(path)?,
    };
    debug!(
        "read_table: {} -> {} columns, {} rows",
        path.display(),
        table.headers.len(),
        table.rows.len()
    );
    Ok(table)
}

fn read_csv(path: &Path) -> ReportResult<Table> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReportError::configuration(path, e))?;
    let headers = rdr
        .headers()
        .map_err(|e| ReportError::configuration(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| ReportError::configuration(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(Table { source: path.to_path_buf(), headers, rows })
}

fn read_spreadsheet(path: &Path) -> ReportResult<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReportError::configuration(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::configuration(path, "workbook has no worksheets"))?
        .map_err(|e| ReportError::configuration(path, e))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(row) => row.iter().map(|c| cell_to_string(c).trim().to_string()).collect(),
        None => Vec::new(),
    };
    let rows = iter
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();
    Ok(Table { source: path.to_path_buf(), headers, rows })
}

/// Spreadsheet cell to its text form. Integral floats lose the `.0` so that a
/// section count of `3` reads the same from xlsx as from CSV.
pub fn cell_to_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Empty | Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}
