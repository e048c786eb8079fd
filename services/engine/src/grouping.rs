//! Grouping and materialization
//!
//! Collapses N flat rows sharing a stock code into one canonical grouped
//! record. Two variants exist: the ingest-time merge over a validated batch
//! ([`group_rows`]) and the query-time aggregation over stored documents
//! ([`group_documents`]), which stays correct even when legacy ungrouped
//! rows remain alongside grouped ones.
//!
//! Both variants follow the same discipline: normalize every underwriter
//! representation to an array, unwind, accumulate the union per stock code,
//! take first-observed scalars and the max `updated_at`, then explicitly
//! deduplicate and sort the set after grouping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use types::ids::{StockCode, UnderwriterCode};
use types::record::{GroupedStockRecord, ListingBoard};

use crate::store::StockDocument;

/// Case-normalized, deduplicated, lexicographically sorted underwriter set
///
/// Grouping alone guarantees neither sort order nor collapse of
/// case-variant duplicates ("az" vs "AZ"); this pass is applied explicitly
/// after every group step.
pub fn canonical_underwriters(
    tokens: impl IntoIterator<Item = UnderwriterCode>,
) -> Vec<UnderwriterCode> {
    let mut set: Vec<UnderwriterCode> = tokens.into_iter().collect();
    set.sort();
    set.dedup();
    set
}

/// One validated ingest row, normalized at the boundary
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub code: StockCode,
    pub underwriters: Vec<UnderwriterCode>,
    pub company_name: String,
    pub ipo_price: Decimal,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: ListingBoard,
    pub listing_date: DateTime<Utc>,
    pub performance_note: Option<String>,
}

/// Merged upsert candidate: one per distinct stock code in a batch
#[derive(Debug, Clone)]
pub struct GroupedCandidate {
    pub code: StockCode,
    pub underwriters: Vec<UnderwriterCode>,
    pub company_name: String,
    pub ipo_price: Decimal,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: ListingBoard,
    pub listing_date: DateTime<Utc>,
    pub performance_note: Option<String>,
    /// Input rows contributing to this candidate
    pub source_rows: usize,
}

/// Ingest-time grouping of a validated batch
///
/// Rows sharing a code merge into one candidate: the underwriter union is
/// accumulated, scalar fields keep the values of the first row seen, and
/// first-seen order of codes is preserved so the merge is deterministic for
/// a given batch.
pub fn group_rows(rows: Vec<NormalizedRow>) -> Vec<GroupedCandidate> {
    let mut order: Vec<StockCode> = Vec::new();
    let mut groups: HashMap<StockCode, GroupedCandidate> = HashMap::new();

    for row in rows {
        match groups.entry(row.code.clone()) {
            Entry::Vacant(slot) => {
                order.push(row.code.clone());
                slot.insert(GroupedCandidate {
                    code: row.code,
                    underwriters: row.underwriters,
                    company_name: row.company_name,
                    ipo_price: row.ipo_price,
                    return_d1: row.return_d1,
                    return_d2: row.return_d2,
                    return_d3: row.return_d3,
                    return_d4: row.return_d4,
                    return_d5: row.return_d5,
                    return_d6: row.return_d6,
                    return_d7: row.return_d7,
                    listing_board: row.listing_board,
                    listing_date: row.listing_date,
                    performance_note: row.performance_note,
                    source_rows: 1,
                });
            }
            Entry::Occupied(mut slot) => {
                let candidate = slot.get_mut();
                candidate.underwriters.extend(row.underwriters);
                candidate.source_rows += 1;
            }
        }
    }

    order
        .into_iter()
        .map(|code| {
            let mut candidate = groups.remove(&code).expect("every ordered code has a group");
            candidate.underwriters =
                canonical_underwriters(std::mem::take(&mut candidate.underwriters));
            candidate
        })
        .collect()
}

struct Group {
    representative: StockDocument,
    tokens: Vec<UnderwriterCode>,
    updated_at: DateTime<Utc>,
}

impl Group {
    fn finish(self) -> GroupedStockRecord {
        let Group {
            representative,
            tokens,
            updated_at,
        } = self;
        let mut record = representative.into_grouped();
        record.underwriters = canonical_underwriters(tokens);
        record.updated_at = updated_at;
        record
    }
}

/// Query-time grouping over the stored collection
///
/// Each document's underwriter representation is normalized to an array and
/// unwound into the per-code union; a null or missing field contributes
/// nothing rather than poisoning the union, and a code whose documents
/// carry no underwriters still appears with an empty set ("unassigned").
///
/// Store iteration order is arbitrary, so documents are first ordered by
/// insertion time: "first observed" then denotes the same representative
/// row on every call.
pub fn group_documents(mut docs: Vec<StockDocument>) -> Vec<GroupedStockRecord> {
    docs.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
    });

    let mut order: Vec<StockCode> = Vec::new();
    let mut groups: HashMap<StockCode, Group> = HashMap::new();

    for doc in docs {
        let tokens = doc.underwriter_tokens();
        match groups.entry(doc.code.clone()) {
            Entry::Vacant(slot) => {
                order.push(doc.code.clone());
                let updated_at = doc.updated_at;
                slot.insert(Group {
                    representative: doc,
                    tokens,
                    updated_at,
                });
            }
            Entry::Occupied(mut slot) => {
                let group = slot.get_mut();
                group.tokens.extend(tokens);
                group.updated_at = group.updated_at.max(doc.updated_at);
            }
        }
    }

    order
        .into_iter()
        .map(|code| {
            groups
                .remove(&code)
                .expect("every ordered code has a group")
                .finish()
        })
        .collect()
}
