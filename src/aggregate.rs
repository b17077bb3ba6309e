use crate::types::FteRecord;
use crate::util::round_to;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_TOP_N: usize = 10;

/// A filter argument: the `all` sentinel or a comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Values(Vec<String>),
}

impl Selection {
    pub fn parse(input: &str) -> Selection {
        if input.trim().eq_ignore_ascii_case("all") {
            return Selection::All;
        }
        let values = input
            .split(',')
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        Selection::Values(values)
    }

    /// Pick the matching entries of `available` (case-insensitive, exact).
    /// Unknown values are dropped; each match appears once.
    pub fn resolve(&self, available: &[String]) -> Vec<String> {
        match self {
            Selection::All => available.to_vec(),
            Selection::Values(values) => {
                let mut picked: Vec<String> = Vec::new();
                for v in values {
                    let wanted = v.to_lowercase();
                    if let Some(hit) = available.iter().find(|a| a.to_lowercase() == wanted) {
                        if !picked.contains(hit) {
                            picked.push(hit.clone());
                        }
                    }
                }
                picked
            }
        }
    }
}

/// Distinct non-empty keys in first-seen order.
pub fn distinct_values<T, F>(items: &[T], key: F) -> Vec<String>
where
    F: Fn(&T) -> String,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let k = key(item);
        if !k.is_empty() && seen.insert(k.clone()) {
            out.push(k);
        }
    }
    out
}

/// Sum of `Generated FTE` per key, keys in first-seen order.
pub fn group_sum<F>(records: &[FteRecord], key: F) -> Vec<(String, f64)>
where
    F: Fn(&FteRecord) -> String,
{
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, f64> = HashMap::new();
    for r in records {
        let k = key(r);
        let e = sums.entry(k.clone()).or_insert_with(|| {
            order.push(k);
            0.0
        });
        *e += r.metrics.generated_fte;
    }
    order
        .into_iter()
        .map(|k| {
            let total = sums.get(&k).copied().unwrap_or(0.0);
            (k, round_to(total, 2))
        })
        .collect()
}

/// The `n` largest items by `sort_key`, descending. Ties keep input order.
pub fn top_n<T, F>(items: &[T], n: usize, sort_key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    let mut ranked: Vec<T> = items.to_vec();
    ranked.sort_by(|a, b| sort_key(b).partial_cmp(&sort_key(a)).unwrap_or(Ordering::Equal));
    ranked.truncate(n);
    ranked
}
