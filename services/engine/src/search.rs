//! Search and filtering over the grouped view
//!
//! A single free-text token is matched case-insensitively and exactly
//! against the *underwriter* dimension only; stock-code and company-name
//! queries deliberately return nothing in the grouped view.
//!
//! Ordering matters: the filter runs on group membership, strictly after
//! grouping. Folding the token into the per-document query would silently
//! drop a multi-underwriter stock whenever the searched token is not that
//! stock's representative row.

use types::ids::UnderwriterCode;
use types::record::GroupedStockRecord;

/// Default page size when the caller does not supply a limit.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Hard ceiling on page size.
pub const MAX_PAGE_SIZE: usize = 500;

/// Parsed free-text query over the underwriter dimension
///
/// A blank or malformed query normalizes to "no filter": everything is
/// returned, never an error.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    token: Option<UnderwriterCode>,
}

impl SearchQuery {
    /// Parse a raw query string
    pub fn parse(raw: Option<&str>) -> Self {
        Self {
            token: raw.and_then(UnderwriterCode::try_new),
        }
    }

    /// Whether this query filters at all
    pub fn is_unfiltered(&self) -> bool {
        self.token.is_none()
    }

    /// Exact-token membership test against a grouped record's set
    pub fn matches(&self, record: &GroupedStockRecord) -> bool {
        match &self.token {
            None => true,
            Some(token) => record.has_underwriter(token),
        }
    }
}

/// Keep only records whose underwriter set contains the query token
///
/// Runs after grouping by contract; `total` for pagination must be taken
/// from the output of this function, not from any pre-filter count.
pub fn filter_records(
    records: Vec<GroupedStockRecord>,
    query: &SearchQuery,
) -> Vec<GroupedStockRecord> {
    if query.is_unfiltered() {
        return records;
    }
    records
        .into_iter()
        .filter(|record| query.matches(record))
        .collect()
}

/// Sort most-recent listing date first; undated records sink to the end
pub fn sort_by_listing_date_desc(records: &mut [GroupedStockRecord]) {
    records.sort_by(|a, b| {
        b.listing_date
            .cmp(&a.listing_date)
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
}

/// Apply offset/limit to an already filtered and sorted set
pub fn paginate(
    records: Vec<GroupedStockRecord>,
    limit: usize,
    offset: usize,
) -> Vec<GroupedStockRecord> {
    records.into_iter().skip(offset).take(limit).collect()
}
