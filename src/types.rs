use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const SEC_NAME: &str = "Sec Name";
pub const SEC_DIVISIONS: &str = "Sec Divisions";
pub const DELIVERY_METHOD: &str = "X Sec Delivery Method";
pub const MEETING_TIMES: &str = "Meeting Times";
pub const CAPACITY: &str = "Capacity";
pub const FACULTY_INFO: &str = "Sec Faculty Info";
pub const FTE_COUNT: &str = "FTE Count";
pub const CONTACT_HOURS: &str = "Contact Hours";

/// Columns every uploaded roster must carry.
pub const ROSTER_REQUIRED: [&str; 6] = [
    SEC_NAME,
    SEC_DIVISIONS,
    DELIVERY_METHOD,
    MEETING_TIMES,
    CAPACITY,
    FACULTY_INFO,
];

/// One roster line as it appears in the file. Numbers stay text until the
/// lenient parser sees them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Sec Name")]
    pub sec_name: Option<String>,
    #[serde(rename = "Sec Divisions")]
    pub sec_divisions: Option<String>,
    #[serde(rename = "X Sec Delivery Method")]
    pub delivery_method: Option<String>,
    #[serde(rename = "Meeting Times")]
    pub meeting_times: Option<String>,
    #[serde(rename = "Capacity")]
    pub capacity: Option<String>,
    #[serde(rename = "Sec Faculty Info")]
    pub faculty_info: Option<String>,
    #[serde(rename = "FTE Count")]
    pub fte_count: Option<String>,
    #[serde(rename = "Contact Hours")]
    pub contact_hours: Option<String>,
    #[serde(rename = "Tier Value")]
    pub tier_value: Option<String>,
}

/// A section after normalization and the reference-table joins.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub section_id: String,
    pub course_code: String,
    pub course_prefix: String,
    pub division: String,
    pub delivery_method: String,
    pub meeting_times: String,
    pub faculty_info: String,
    pub capacity: f64,
    pub fte_count: f64,
    pub contact_hours: f64,
    pub tier_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub calculated_fte: f64,
    pub generated_fte: f64,
    /// `fte_count / capacity`, 4 decimals; 0 when capacity is 0.
    pub enrollment_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FteRecord {
    pub section: SectionRecord,
    pub metrics: Metrics,
}

/// Console line for a Top 10 listing.
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct TopEntry {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Label")]
    #[tabled(rename = "Label")]
    pub label: String,
    #[serde(rename = "GeneratedFte")]
    #[tabled(rename = "Generated FTE")]
    pub generated_fte: String,
}

/// Written with `--summary`; one entry per invocation.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub report: String,
    pub filter: String,
    pub files: Vec<String>,
    pub sections: usize,
    pub total_generated_fte: f64,
    pub generated_at: DateTime<Local>,
}
