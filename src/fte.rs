//! FTE funding arithmetic. Every report computes its metrics here.

use crate::types::{FteRecord, Metrics, SectionRecord};
use crate::util::round_to;

/// Instructional weeks in a term.
pub const WEEKS_PER_TERM: f64 = 16.0;
/// Contact hours that make up one full-time equivalent.
pub const FTE_HOURS: f64 = 512.0;
/// Base funding rate added to the tier value.
pub const BASE_RATE: f64 = 1926.0;

pub fn metrics_for(section: &SectionRecord) -> Metrics {
    let calculated_fte = round_to(
        section.contact_hours * WEEKS_PER_TERM * section.fte_count / FTE_HOURS,
        3,
    );
    let generated_fte = round_to((section.tier_value + BASE_RATE) * calculated_fte, 2);
    let enrollment_ratio = if section.capacity > 0.0 {
        round_to(section.fte_count / section.capacity, 4)
    } else {
        0.0
    };
    Metrics { calculated_fte, generated_fte, enrollment_ratio }
}

pub fn compute_metrics(records: &[SectionRecord]) -> Vec<FteRecord> {
    records
        .iter()
        .map(|section| FteRecord { section: section.clone(), metrics: metrics_for(section) })
        .collect()
}

/// Value of the synthetic `Total` row.
pub fn total_generated_fte(records: &[FteRecord]) -> f64 {
    round_to(records.iter().map(|r| r.metrics.generated_fte).sum(), 2)
}

/// `0.5` renders as `50.00%`.
pub fn enrollment_percent_label(section: &SectionRecord) -> String {
    if section.capacity > 0.0 {
        format!("{:.2}%", round_to(section.fte_count / section.capacity * 100.0, 2))
    } else {
        "0.00%".to_string()
    }
}

#[cfg(test)]
pub(crate) fn sample_section(id: &str, capacity: f64, fte: f64, hours: f64, tier: f64) -> SectionRecord {
    let (course_code, course_prefix) = crate::loader::split_section_id(id);
    SectionRecord {
        section_id: id.to_string(),
        course_code,
        course_prefix,
        division: "HUM".to_string(),
        delivery_method: "In Person".to_string(),
        meeting_times: "MW 9:00".to_string(),
        faculty_info: "Jane Smith".to_string(),
        capacity,
        fte_count: fte,
        contact_hours: hours,
        tier_value: tier,
    }
}
