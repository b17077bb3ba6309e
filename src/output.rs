use crate::error::{ReportError, ReportResult};
use crate::reports::{Cell, ChartSpec, ReportBook, SheetData};
use log::info;
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook, Worksheet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

const MAX_SHEET_NAME: usize = 31;

/// Render `book` as `dir/<file_name>`, creating `dir` when needed.
pub fn write_workbook(dir: &Path, book: &ReportBook) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| ReportError::export(dir, e))?;
    let path = dir.join(&book.file_name);

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    for sheet in &book.sheets {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &header).map_err(|e| ReportError::export(&path, e))?;
        if let Some(chart) = book.chart.as_ref().filter(|c| c.sheet == sheet.name) {
            insert_chart(worksheet, chart).map_err(|e| ReportError::export(&path, e))?;
        }
    }
    workbook.save(&path).map_err(|e| ReportError::export(&path, e))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    sheet: &SheetData,
    header: &Format,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    worksheet.set_name(sheet_name(&sheet.name))?;
    for (col, name) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, header)?;
    }
    for (r, row) in sheet.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                Cell::Text(s) if !s.is_empty() => {
                    worksheet.write_string(r, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, col, *n)?;
                }
                Cell::Text(_) | Cell::Blank => {}
            }
        }
    }
    if !sheet.headers.is_empty() {
        worksheet.autofit();
    }
    Ok(())
}

fn insert_chart(worksheet: &mut Worksheet, chart_spec: &ChartSpec) -> Result<(), rust_xlsxwriter::XlsxError> {
    if chart_spec.points == 0 {
        return Ok(());
    }
    let source = sheet_name(&chart_spec.source_sheet);
    let last = chart_spec.points as u32;

    let mut chart = Chart::new(ChartType::Bar);
    chart.title().set_name(&chart_spec.title);
    chart
        .add_series()
        .set_name("Generated FTE")
        .set_categories((source.as_str(), 1, chart_spec.label_col, last, chart_spec.label_col))
        .set_values((source.as_str(), 1, chart_spec.value_col, last, chart_spec.value_col));
    // bar charts put categories on the y axis; largest value first, at the top
    chart.y_axis().set_reverse();
    chart.x_axis().set_name("Generated FTE");
    chart.legend().set_hidden();
    chart.set_width(800).set_height(480);

    worksheet.insert_chart(1, 1, &chart)?;
    Ok(())
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`.
pub fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    if cleaned.is_empty() {
        "Sheet1".to_string()
    } else {
        cleaned
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ReportResult<()> {
    let s = serde_json::to_string_pretty(value).map_err(|e| ReportError::export(path, e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::export(parent, e))?;
    }
    fs::write(path, s).map_err(|e| ReportError::export(path, e))?;
    Ok(())
}

/// Markdown preview of the first `max_rows` rows of a sheet.
pub fn preview_sheet(sheet: &SheetData, max_rows: usize) -> String {
    if sheet.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(sheet.headers.iter().cloned());
    for row in sheet.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(Cell::to_string));
    }
    let mut table = builder.build();
    table.with(Style::markdown());
    let mut out = table.to_string();
    if sheet.rows.len() > max_rows {
        out.push_str(&format!("\n... {} more rows", sheet.rows.len() - max_rows));
    }
    out
}

pub fn preview_table<T>(title: &str, rows: &[T])
where
    T: Tabled + Clone,
{
    println!("\n{}\n", title);
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(rows.to_vec()).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fte::sample_section;
    use crate::reports::{fte_by_division, FTE_HEADERS, TOTAL_LABEL};
    use crate::table::read_table;
    use calamine::{open_workbook_auto, Reader};
    use pretty_assertions::assert_eq;
    use std::io::Read;

    fn chart_xml(path: &Path) -> String {
        let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        let mut xml = String::new();
        archive
            .by_name("xl/charts/chart1.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    fn element<'a>(xml: &'a str, tag: &str) -> &'a str {
        let open = format!("<c:{}>", tag);
        let close = format!("</c:{}>", tag);
        let start = xml.find(&open).unwrap();
        let end = xml[start..].find(&close).unwrap() + start;
        &xml[start..end]
    }

    fn book() -> ReportBook {
        let records = vec![
            sample_section("ENG-101-01", 30.0, 15.0, 3.0, 2.0),
            sample_section("ENG-101-02", 25.0, 20.0, 4.0, 2.0),
            sample_section("MTH-200-01", 0.0, 16.0, 4.0, 0.0),
        ];
        fte_by_division(&records, "hum").unwrap().remove(0)
    }

    #[test]
    fn exported_fte_report_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let book = book();
        let path = write_workbook(&dir.path().join("out"), &book).unwrap();
        assert_eq!(path.file_name().unwrap(), "hum_fte_report.xlsx");

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, FTE_HEADERS.to_vec());
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[0][2], "ENG-101-01");
        assert_eq!(table.rows[0][8], "1.406");
        assert_eq!(table.rows[0][9], "0.5");
        assert_eq!(table.rows[0][10], "2710.77");
        assert_eq!(table.rows[2][9], "0");

        let total = &table.rows[3];
        assert_eq!(total[0], "");
        assert_eq!(total[2], TOTAL_LABEL);
        assert_eq!(total[10], book.total_generated_fte.to_string());
    }

    #[test]
    fn fte_books_carry_all_three_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(dir.path(), &book()).unwrap();
        let workbook = open_workbook_auto(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["FTE Report", "Top 10 FTE", "FTE Chart"]);
    }

    #[test]
    fn chart_lists_largest_course_at_the_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_workbook(dir.path(), &book()).unwrap();
        let xml = chart_xml(&path);

        assert!(xml.contains("<c:barDir val=\"bar\"/>"));
        assert!(xml.contains("'Top 10 FTE'!$A$2:$A$3"));
        assert!(xml.contains("'Top 10 FTE'!$B$2:$B$3"));

        let categories = element(&xml, "catAx");
        assert!(categories.contains("<c:orientation val=\"maxMin\"/>"));
        assert!(!categories.contains("<c:title>"));

        let values = element(&xml, "valAx");
        assert!(values.contains("<c:orientation val=\"minMax\"/>"));
        assert!(values.contains("<c:title>"));
    }

    #[test]
    fn sheet_names_follow_excel_rules() {
        assert_eq!(sheet_name("arts/hum [day]"), "arts_hum _day_");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("  "), "Sheet1");
    }

    #[test]
    fn preview_is_truncated_to_max_rows() {
        let book = book();
        let text = preview_sheet(&book.sheets[0], 2);
        assert!(text.contains("| Sec Divisions"));
        assert!(text.contains("ENG-101-02"));
        assert!(!text.contains("MTH-200-01"));
        assert!(text.ends_with("... 2 more rows"));
    }

    #[test]
    fn json_summary_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.json");
        write_json(&path, &serde_json::json!({ "sections": 3 })).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"sections\": 3"));
    }
}
