//! Statistics over the grouped view
//!
//! Counts are computed fresh from the view on every call, never cached, so
//! they are always consistent with the store at call time. Under concurrent
//! writes the result is a best-effort snapshot, not an isolated one.

use std::collections::{HashMap, HashSet};
use types::ids::UnderwriterCode;
use types::record::{GroupedStockRecord, StatsSnapshot, UnderwriterActivity};

/// Cross-cutting counts over the grouped view
///
/// `total_underwriters` counts distinct tokens across the flattened union
/// of every record's set, which is strictly different from summing
/// per-record set sizes: that would overcount shared underwriters. One stock is one
/// company in this model, so `total_companies == total_stocks`. An empty
/// view yields zeros and no timestamp, never an error.
pub fn compute(records: &[GroupedStockRecord]) -> StatsSnapshot {
    let total_stocks = records.len();

    let mut tokens: HashSet<&UnderwriterCode> = HashSet::new();
    for record in records {
        tokens.extend(record.underwriters.iter());
    }

    let last_updated = records.iter().map(|record| record.updated_at).max();

    StatsSnapshot {
        total_stocks,
        total_underwriters: tokens.len(),
        total_companies: total_stocks,
        last_updated,
    }
}

/// Per-underwriter IPO participation counts
///
/// Flattens every record's set and counts, for each token, the number of
/// stocks it appears on. Optionally filtered by a case-insensitive
/// substring of the token; sorted by count descending, then token.
pub fn underwriter_activity(
    records: &[GroupedStockRecord],
    search: Option<&str>,
) -> Vec<UnderwriterActivity> {
    let needle = search
        .map(|raw| raw.trim().to_uppercase())
        .filter(|s| !s.is_empty());

    let mut counts: HashMap<&UnderwriterCode, usize> = HashMap::new();
    for record in records {
        for token in &record.underwriters {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut activity: Vec<UnderwriterActivity> = counts
        .into_iter()
        .filter(|(token, _)| {
            needle
                .as_ref()
                .map_or(true, |needle| token.as_str().contains(needle.as_str()))
        })
        .map(|(token, ipo_count)| UnderwriterActivity {
            code: token.clone(),
            ipo_count,
        })
        .collect();

    activity.sort_by(|a, b| b.ipo_count.cmp(&a.ipo_count).then_with(|| a.code.cmp(&b.code)));
    activity
}
