use crate::aggregate::{distinct_values, group_sum, top_n, Selection, DEFAULT_TOP_N};
use crate::error::{ReportError, ReportResult};
use crate::fte::{compute_metrics, enrollment_percent_label, total_generated_fte};
use crate::loader::Roster;
use crate::table::cell;
use crate::types::{FteRecord, SectionRecord, TopEntry, SEC_DIVISIONS};
use crate::util::{format_number, sanitize_file_stem};
use std::fmt;

pub const FTE_REPORT_SHEET: &str = "FTE Report";
pub const TOP_SHEET: &str = "Top 10 FTE";
pub const CHART_SHEET: &str = "FTE Chart";
pub const ENROLLMENT_SHEET: &str = "Enrollment Data";
pub const TOTAL_LABEL: &str = "Total";

pub const FTE_HEADERS: [&str; 11] = [
    "Sec Divisions",
    "Course Code",
    "Sec Name",
    "Delivery Method",
    "Meeting Times",
    "Capacity",
    "FTE Count",
    "Contact Hours",
    "Calculated FTE",
    "Enrollment Per",
    "Generated FTE",
];
const FTE_LABEL_COL: u16 = 2;
const FTE_VALUE_COL: u16 = 10;

pub const ENROLLMENT_HEADERS: [&str; 10] = [
    "Sec Divisions",
    "Sec Name",
    "Delivery Method",
    "Meeting Times",
    "Capacity",
    "FTE Count",
    "Contact Hours",
    "Calculated FTE",
    "Sec Faculty Info",
    "Enrollment Percentage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    DivisionExtract,
    CourseEnrollment,
    FteByDivision,
    FteByInstructor,
    FteByCourse,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportKind::DivisionExtract => "Sec Division Report",
            ReportKind::CourseEnrollment => "Course Enrollment Percentage",
            ReportKind::FteByDivision => "FTE by Division",
            ReportKind::FteByInstructor => "FTE per Instructor",
            ReportKind::FteByCourse => "FTE per Course",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Blank,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Blank => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Bar chart over two columns of another sheet in the same book.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub sheet: String,
    pub source_sheet: String,
    pub title: String,
    pub label_col: u16,
    pub value_col: u16,
    pub points: usize,
}

/// Everything needed to write one workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBook {
    pub kind: ReportKind,
    pub filter: String,
    pub file_name: String,
    pub sheets: Vec<SheetData>,
    pub chart: Option<ChartSpec>,
    pub top: Vec<TopEntry>,
    pub sections: usize,
    pub total_generated_fte: f64,
}

pub fn division_extract(roster: &Roster, input: &str) -> ReportResult<Vec<ReportBook>> {
    let idx = roster.table.column(SEC_DIVISIONS);
    let available = distinct_values(&roster.table.rows, |row| match idx {
        Some(i) => cell(row, i).trim().to_lowercase(),
        None => String::new(),
    });
    let selected = Selection::parse(input).resolve(&available);
    if selected.is_empty() {
        return Err(ReportError::NotFound(
            "No valid divisions entered. Please check your input.".to_string(),
        ));
    }

    let books = selected
        .into_iter()
        .map(|division| {
            let rows: Vec<Vec<Cell>> = roster
                .rows_for_division(&division)
                .map(|row| {
                    // pad short CSV lines so every row spans the header
                    (0..roster.headers().len())
                        .map(|i| Cell::Text(cell(row, i).to_string()))
                        .collect()
                })
                .collect();
            ReportBook {
                kind: ReportKind::DivisionExtract,
                filter: division.clone(),
                file_name: format!("{}.xlsx", sanitize_file_stem(&division)),
                sections: rows.len(),
                sheets: vec![SheetData {
                    name: division,
                    headers: roster.headers().to_vec(),
                    rows,
                }],
                chart: None,
                top: Vec::new(),
                total_generated_fte: 0.0,
            }
        })
        .collect();
    Ok(books)
}

pub fn course_enrollment(records: &[SectionRecord], input: &str) -> ReportResult<Vec<ReportBook>> {
    let selected = select_courses(records, input, "No data found for that Course Code.")?;
    let books = selected
        .into_iter()
        .map(|code| {
            let sections: Vec<SectionRecord> =
                records.iter().filter(|r| r.course_code == code).cloned().collect();
            let computed = compute_metrics(&sections);
            let rows = computed
                .iter()
                .map(|r| {
                    let s = &r.section;
                    vec![
                        Cell::Text(s.division.clone()),
                        Cell::Text(s.section_id.clone()),
                        Cell::Text(s.delivery_method.clone()),
                        Cell::Text(s.meeting_times.clone()),
                        Cell::Number(s.capacity),
                        Cell::Number(s.fte_count),
                        Cell::Number(s.contact_hours),
                        Cell::Number(r.metrics.calculated_fte),
                        Cell::Text(s.faculty_info.clone()),
                        Cell::Text(enrollment_percent_label(s)),
                    ]
                })
                .collect();
            ReportBook {
                kind: ReportKind::CourseEnrollment,
                file_name: format!("{}_enrollment_report.xlsx", course_file_stem(&code)),
                filter: code,
                sheets: vec![SheetData {
                    name: ENROLLMENT_SHEET.to_string(),
                    headers: headers(&ENROLLMENT_HEADERS),
                    rows,
                }],
                chart: None,
                top: Vec::new(),
                sections: computed.len(),
                total_generated_fte: total_generated_fte(&computed),
            }
        })
        .collect();
    Ok(books)
}

pub fn fte_by_division(records: &[SectionRecord], input: &str) -> ReportResult<Vec<ReportBook>> {
    let available = distinct_values(records, |r| division_key(&r.division));
    let selected = Selection::parse(input).resolve(&available);
    if selected.is_empty() {
        return Err(ReportError::NotFound("No data found for this division.".to_string()));
    }

    let books = selected
        .into_iter()
        .map(|division| {
            let mut sections: Vec<SectionRecord> = records
                .iter()
                .filter(|r| division_key(&r.division) == division)
                .cloned()
                .collect();
            sections.sort_by(|a, b| a.section_id.cmp(&b.section_id));
            let computed = compute_metrics(&sections);

            let by_course = group_sum(&computed, |r| r.section.course_code.clone());
            let top = top_n(&by_course, DEFAULT_TOP_N, |(_, total)| *total);
            let top_sheet = SheetData {
                name: TOP_SHEET.to_string(),
                headers: headers(&["Course Code", "Generated FTE"]),
                rows: top
                    .iter()
                    .map(|(code, total)| vec![Cell::Text(code.clone()), Cell::Number(*total)])
                    .collect(),
            };
            let chart = ChartSpec {
                sheet: CHART_SHEET.to_string(),
                source_sheet: TOP_SHEET.to_string(),
                title: "Top 10 Courses by Generated FTE".to_string(),
                label_col: 0,
                value_col: 1,
                points: top.len(),
            };
            let top_entries = top_entries(top.iter().map(|(code, total)| (code.clone(), *total)));
            fte_book(
                ReportKind::FteByDivision,
                format!("{}_fte_report.xlsx", sanitize_file_stem(&division)),
                division,
                &computed,
                top_sheet,
                chart,
                top_entries,
            )
        })
        .collect();
    Ok(books)
}

pub fn fte_per_instructor(records: &[SectionRecord], instructor: &str) -> ReportResult<ReportBook> {
    let needle = instructor.trim().to_lowercase();
    let mut sections: Vec<SectionRecord> = if needle.is_empty() {
        Vec::new()
    } else {
        records
            .iter()
            .filter(|r| r.faculty_info.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    };
    if sections.is_empty() {
        return Err(ReportError::NotFound("No matching instructor found.".to_string()));
    }
    sections.sort_by(|a, b| {
        a.course_code
            .cmp(&b.course_code)
            .then_with(|| a.section_id.cmp(&b.section_id))
    });
    let computed = compute_metrics(&sections);
    let name = instructor.trim().to_string();
    Ok(section_ranked_book(
        ReportKind::FteByInstructor,
        format!("{}_fte_report.xlsx", faculty_code(&name)),
        name.clone(),
        &computed,
        format!("Top 10 FTE for {}", name),
    ))
}

pub fn fte_per_course(records: &[SectionRecord], input: &str) -> ReportResult<Vec<ReportBook>> {
    let selected = select_courses(records, input, "No data found for this course code.")?;
    let books = selected
        .into_iter()
        .map(|code| {
            let sections: Vec<SectionRecord> =
                records.iter().filter(|r| r.course_code == code).cloned().collect();
            let computed = compute_metrics(&sections);
            section_ranked_book(
                ReportKind::FteByCourse,
                format!("{}_fte_report.xlsx", course_file_stem(&code)),
                code.clone(),
                &computed,
                format!("Top 10 FTE for {}", code),
            )
        })
        .collect();
    Ok(books)
}

/// Distinct values of a filter column, sorted for display.
pub fn available_values(records: &[SectionRecord], what: FilterColumn) -> Vec<String> {
    let mut values = match what {
        FilterColumn::Divisions => distinct_values(records, |r| division_key(&r.division)),
        FilterColumn::Courses => distinct_values(records, |r| r.course_code.clone()),
        FilterColumn::Instructors => distinct_values(records, |r| r.faculty_info.clone()),
    };
    values.sort();
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Divisions,
    Courses,
    Instructors,
}

/// `jane smith` -> `smithj`; single-word names fall back to `faculty`.
pub fn faculty_code(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) if parts.len() >= 2 => {
            let initial: String = first.chars().take(1).collect();
            sanitize_file_stem(&format!("{}{}", last.to_lowercase(), initial.to_lowercase()))
        }
        _ => "faculty".to_string(),
    }
}

pub fn course_file_stem(code: &str) -> String {
    sanitize_file_stem(&code.replace('-', "").to_lowercase())
}

fn division_key(division: &str) -> String {
    division.trim().to_lowercase()
}

fn select_courses(records: &[SectionRecord], input: &str, not_found: &str) -> ReportResult<Vec<String>> {
    let available = distinct_values(records, |r| r.course_code.clone());
    let selected = Selection::parse(input).resolve(&available);
    if selected.is_empty() {
        return Err(ReportError::NotFound(not_found.to_string()));
    }
    Ok(selected)
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn fte_row(r: &FteRecord) -> Vec<Cell> {
    let s = &r.section;
    vec![
        Cell::Text(s.division.clone()),
        Cell::Text(s.course_code.clone()),
        Cell::Text(s.section_id.clone()),
        Cell::Text(s.delivery_method.clone()),
        Cell::Text(s.meeting_times.clone()),
        Cell::Number(s.capacity),
        Cell::Number(s.fte_count),
        Cell::Number(s.contact_hours),
        Cell::Number(r.metrics.calculated_fte),
        Cell::Number(r.metrics.enrollment_ratio),
        Cell::Number(r.metrics.generated_fte),
    ]
}

fn total_row(total: f64) -> Vec<Cell> {
    let mut row = vec![Cell::Blank; FTE_HEADERS.len()];
    row[FTE_LABEL_COL as usize] = Cell::Text(TOTAL_LABEL.to_string());
    row[FTE_VALUE_COL as usize] = Cell::Number(total);
    row
}

fn top_entries<I>(items: I) -> Vec<TopEntry>
where
    I: IntoIterator<Item = (String, f64)>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(i, (label, value))| TopEntry {
            rank: i + 1,
            label,
            generated_fte: format_number(value, 2),
        })
        .collect()
}

// Instructor and course reports rank individual sections.
fn section_ranked_book(
    kind: ReportKind,
    file_name: String,
    filter: String,
    computed: &[FteRecord],
    title: String,
) -> ReportBook {
    let top = top_n(computed, DEFAULT_TOP_N, |r| r.metrics.generated_fte);
    let top_sheet = SheetData {
        name: TOP_SHEET.to_string(),
        headers: headers(&FTE_HEADERS),
        rows: top.iter().map(fte_row).collect(),
    };
    let chart = ChartSpec {
        sheet: CHART_SHEET.to_string(),
        source_sheet: TOP_SHEET.to_string(),
        title,
        label_col: FTE_LABEL_COL,
        value_col: FTE_VALUE_COL,
        points: top.len(),
    };
    let entries = top_entries(
        top.iter()
            .map(|r| (r.section.section_id.clone(), r.metrics.generated_fte)),
    );
    fte_book(kind, file_name, filter, computed, top_sheet, chart, entries)
}

fn fte_book(
    kind: ReportKind,
    file_name: String,
    filter: String,
    computed: &[FteRecord],
    top_sheet: SheetData,
    chart: ChartSpec,
    top: Vec<TopEntry>,
) -> ReportBook {
    let total = total_generated_fte(computed);
    let mut rows: Vec<Vec<Cell>> = computed.iter().map(fte_row).collect();
    rows.push(total_row(total));
    ReportBook {
        kind,
        filter,
        file_name,
        sheets: vec![
            SheetData {
                name: FTE_REPORT_SHEET.to_string(),
                headers: headers(&FTE_HEADERS),
                rows,
            },
            top_sheet,
            SheetData {
                name: CHART_SHEET.to_string(),
                headers: Vec::new(),
                rows: Vec::new(),
            },
        ],
        chart: Some(chart),
        top,
        sections: computed.len(),
        total_generated_fte: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fte::sample_section;
    use crate::table::Table;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn with_div_faculty(mut s: SectionRecord, division: &str, faculty: &str) -> SectionRecord {
        s.division = division.to_string();
        s.faculty_info = faculty.to_string();
        s
    }

    fn records() -> Vec<SectionRecord> {
        vec![
            with_div_faculty(sample_section("ENG-101-02", 25.0, 20.0, 4.0, 2.0), "HUM", "Jane Smith"),
            with_div_faculty(sample_section("ENG-101-01", 30.0, 15.0, 3.0, 2.0), "HUM", "Jane Smith"),
            with_div_faculty(sample_section("HIS-110-01", 0.0, 10.0, 3.0, 0.0), "hum ", "Omar Reyes"),
            with_div_faculty(sample_section("BIO-120-01", 24.0, 12.0, 4.0, 5.0), "SCI", "Raj Patel, Jane Smithers"),
        ]
    }

    fn generated(row: &[Cell]) -> f64 {
        match &row[FTE_VALUE_COL as usize] {
            Cell::Number(n) => *n,
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn division_report_sorts_and_totals() {
        let books = fte_by_division(&records(), "HUM").unwrap();
        assert_eq!(books.len(), 1);
        let book = &books[0];
        assert_eq!(book.file_name, "hum_fte_report.xlsx");
        let names: Vec<&str> = book.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["FTE Report", "Top 10 FTE", "FTE Chart"]);

        let report = &book.sheets[0];
        assert_eq!(report.headers, FTE_HEADERS.to_vec());
        assert_eq!(report.rows.len(), 4);
        assert_eq!(report.rows[0][2], Cell::Text("ENG-101-01".into()));
        assert_eq!(report.rows[2][2], Cell::Text("HIS-110-01".into()));

        let total = report.rows.last().unwrap();
        assert_eq!(total[2], Cell::Text("Total".into()));
        assert_eq!(total[0], Cell::Blank);
        let sum: f64 = report.rows[..3].iter().map(|r| generated(r)).sum();
        assert!((generated(total) - sum).abs() < 1e-6);
        assert!((book.total_generated_fte - sum).abs() < 1e-6);
    }

    #[test]
    fn division_top_ten_groups_by_course() {
        let book = &fte_by_division(&records(), "hum").unwrap()[0];
        let top = &book.sheets[1];
        assert_eq!(top.headers, vec!["Course Code", "Generated FTE"]);
        assert_eq!(top.rows.len(), 2);
        assert_eq!(top.rows[0][0], Cell::Text("ENG-101".into()));
        assert_eq!(top.rows[0][1], Cell::Number(7530.77));
        assert!(top.rows.iter().all(|r| r[0] != Cell::Text(TOTAL_LABEL.into())));
        assert_eq!(book.chart.as_ref().unwrap().points, 2);
    }

    #[test]
    fn all_selects_each_division_once() {
        let books = fte_by_division(&records(), "ALL").unwrap();
        let files: Vec<&str> = books.iter().map(|b| b.file_name.as_str()).collect();
        assert_eq!(files, vec!["hum_fte_report.xlsx", "sci_fte_report.xlsx"]);
        let sections: usize = books.iter().map(|b| b.sections).sum();
        assert_eq!(sections, records().len());
    }

    #[test]
    fn instructor_match_is_substring_and_case_insensitive() {
        let book = fte_per_instructor(&records(), "jane smith").unwrap();
        assert_eq!(book.file_name, "smithj_fte_report.xlsx");
        assert_eq!(book.sections, 3);
        let report = &book.sheets[0];
        let ids: Vec<String> = report.rows.iter().map(|r| r[2].to_string()).collect();
        assert_eq!(ids, vec!["BIO-120-01", "ENG-101-01", "ENG-101-02", "Total"]);

        let top = &book.sheets[1];
        assert_eq!(top.rows.len(), 3);
        assert_eq!(top.rows[0][2], Cell::Text("ENG-101-02".into()));
        assert!(top.rows.iter().all(|r| r[2] != Cell::Text(TOTAL_LABEL.into())));
        assert_eq!(book.chart.as_ref().unwrap().title, "Top 10 FTE for jane smith");
    }

    #[test]
    fn accented_divisions_match_in_any_case() {
        let mut rows = records();
        rows[3].division = "Études".to_string();
        let books = fte_by_division(&rows, "ÉTUDES").unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].file_name, "études_fte_report.xlsx");
        assert_eq!(books[0].sections, 1);
    }

    #[test]
    fn unknown_instructor_is_not_found() {
        assert!(matches!(fte_per_instructor(&records(), "Nobody"), Err(ReportError::NotFound(_))));
        assert!(matches!(fte_per_instructor(&records(), "  "), Err(ReportError::NotFound(_))));
    }

    #[test]
    fn course_report_keeps_roster_order() {
        let book = &fte_per_course(&records(), "eng-101").unwrap()[0];
        assert_eq!(book.file_name, "eng101_fte_report.xlsx");
        let report = &book.sheets[0];
        assert_eq!(report.rows[0][2], Cell::Text("ENG-101-02".into()));
        assert_eq!(report.rows[1][2], Cell::Text("ENG-101-01".into()));
        assert_eq!(book.top[0].label, "ENG-101-02");
        assert_eq!(book.top[0].generated_fte, "4,820.00");
    }

    #[test]
    fn unknown_course_is_not_found() {
        match fte_per_course(&records(), "ZZZ-999") {
            Err(ReportError::NotFound(msg)) => assert_eq!(msg, "No data found for this course code."),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn enrollment_report_formats_percentages() {
        let book = &course_enrollment(&records(), "HIS-110").unwrap()[0];
        assert_eq!(book.file_name, "his110_enrollment_report.xlsx");
        let sheet = &book.sheets[0];
        assert_eq!(sheet.name, "Enrollment Data");
        assert_eq!(sheet.headers, ENROLLMENT_HEADERS.to_vec());
        assert_eq!(sheet.rows[0][9], Cell::Text("0.00%".into()));
        assert!(book.chart.is_none());

        let eng = &course_enrollment(&records(), "ENG-101").unwrap()[0];
        assert_eq!(eng.sheets[0].rows[0][9], Cell::Text("80.00%".into()));
        assert_eq!(eng.sheets[0].rows[1][9], Cell::Text("50.00%".into()));
    }

    #[test]
    fn division_extract_copies_original_columns() {
        let roster = Roster {
            table: Table {
                source: PathBuf::from("roster.csv"),
                headers: vec!["Sec Name".into(), "Sec Divisions".into(), "Room".into()],
                rows: vec![
                    vec!["eng-101-01".into(), "HUM".into(), "B12".into()],
                    vec!["bio-120-01".into(), " sci".into()],
                    vec!["eng-101-01".into(), "hum".into(), "B14".into()],
                ],
            },
        };
        let books = division_extract(&roster, "all").unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].file_name, "hum.xlsx");
        assert_eq!(books[0].sheets[0].rows.len(), 2);
        assert_eq!(books[0].sheets[0].rows[0][0], Cell::Text("eng-101-01".into()));
        assert_eq!(books[1].sheets[0].rows[0][2], Cell::Text(String::new()));

        let picked = division_extract(&roster, "SCI, art").unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].file_name, "sci.xlsx");
        assert!(matches!(division_extract(&roster, "art"), Err(ReportError::NotFound(_))));
    }

    #[test]
    fn faculty_codes_follow_last_name_and_initial() {
        assert_eq!(faculty_code("Jane Smith"), "smithj");
        assert_eq!(faculty_code("Mary Ann Lopez"), "lopezm");
        assert_eq!(faculty_code("Cher"), "faculty");
    }

    #[test]
    fn single_word_instructor_gets_generic_file_name() {
        let mut rows = records();
        rows[2].faculty_info = "Cher".to_string();
        let book = fte_per_instructor(&rows, "cher").unwrap();
        assert_eq!(book.file_name, "faculty_fte_report.xlsx");
        assert_eq!(book.sections, 1);
    }

    #[test]
    fn listing_values_is_sorted_and_distinct() {
        assert_eq!(available_values(&records(), FilterColumn::Divisions), vec!["hum", "sci"]);
        assert_eq!(
            available_values(&records(), FilterColumn::Courses),
            vec!["BIO-120", "ENG-101", "HIS-110"]
        );
    }
}
