//! Bulk ingest/upsert pipeline
//!
//! Consumes an ordered batch of flat or grouped-shaped records, validates
//! each one, merges rows sharing a stock code, and upserts the result into
//! the grouped collection. The batch is not atomic: per-record failures are
//! collected into the report and never abort sibling records.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::{EngineError, ValidationError};
use types::ids::{NativeId, RecordId, StockCode, UnderwriterCode};
use types::record::{
    BulkReport, FlatUnderwritingRecord, GroupedRecordCreate, ListingBoard, UnderwriterField,
};

use crate::grouping::{self, GroupedCandidate, NormalizedRow};
use crate::store::{DocumentStore, RecordPatch, StockDocument, StoreError};

/// Upper bound on failure reasons carried in a [`BulkReport`]
///
/// `failed` still counts every failure; only the reason strings are capped.
pub const MAX_REPORTED_ERRORS: usize = 50;

/// One record in a bulk ingest batch
///
/// Batches may carry grouped-shaped inputs (underwriter list) or flat
/// one-underwriter rows; the untagged union keys on which field is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkEntry {
    Grouped(GroupedRecordCreate),
    Flat(FlatUnderwritingRecord),
}

impl BulkEntry {
    /// Raw stock code, for failure labels only
    fn code_label(&self) -> &str {
        match self {
            BulkEntry::Grouped(input) => &input.code,
            BulkEntry::Flat(row) => &row.code,
        }
    }
}

/// Parse a listing date in either RFC 3339 or plain `YYYY-MM-DD` form
pub fn parse_listing_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn validate_scalars(
    code_raw: &str,
    company_raw: &str,
    price: Option<Decimal>,
    board_raw: Option<&str>,
    date_raw: Option<&str>,
) -> Result<(StockCode, String, Decimal, ListingBoard, DateTime<Utc>), ValidationError> {
    let code = StockCode::try_new(code_raw)
        .ok_or_else(|| ValidationError::InvalidStockCode(code_raw.to_string()))?;

    let company = company_raw.trim();
    if company.is_empty() {
        return Err(ValidationError::EmptyCompanyName);
    }

    let price = price.ok_or(ValidationError::MissingPrice)?;
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(price.to_string()));
    }

    let board_raw = board_raw.ok_or(ValidationError::MissingListingBoard)?;
    let board = board_raw
        .parse::<ListingBoard>()
        .map_err(|_| ValidationError::UnknownListingBoard(board_raw.to_string()))?;

    let date_raw = date_raw.ok_or(ValidationError::MissingListingDate)?;
    let date = parse_listing_date(date_raw)
        .ok_or_else(|| ValidationError::InvalidListingDate(date_raw.to_string()))?;

    Ok((code, company.to_string(), price, board, date))
}

/// Validate a grouped-shaped input into a normalized row
///
/// Shared with the direct create path, so both boundaries apply the same
/// rules: non-empty underwriter list, well-formed codes, positive price,
/// known listing board, parseable listing date.
pub fn validate_create(input: &GroupedRecordCreate) -> Result<NormalizedRow, ValidationError> {
    if input.underwriters.is_empty() {
        return Err(ValidationError::EmptyUnderwriters);
    }
    let mut underwriters = Vec::with_capacity(input.underwriters.len());
    for raw in &input.underwriters {
        let token = UnderwriterCode::try_new(raw.clone())
            .ok_or_else(|| ValidationError::InvalidUnderwriter(raw.clone()))?;
        underwriters.push(token);
    }

    let (code, company_name, ipo_price, listing_board, listing_date) = validate_scalars(
        &input.code,
        &input.company_name,
        input.ipo_price,
        input.listing_board.as_deref(),
        input.listing_date.as_deref(),
    )?;

    Ok(NormalizedRow {
        code,
        underwriters,
        company_name,
        ipo_price,
        return_d1: input.return_d1,
        return_d2: input.return_d2,
        return_d3: input.return_d3,
        return_d4: input.return_d4,
        return_d5: input.return_d5,
        return_d6: input.return_d6,
        return_d7: input.return_d7,
        listing_board,
        listing_date,
        performance_note: trimmed_note(input.performance_note.as_deref()),
    })
}

/// Validate a flat one-underwriter row into a normalized row
pub fn validate_flat(row: &FlatUnderwritingRecord) -> Result<NormalizedRow, ValidationError> {
    let token = UnderwriterCode::try_new(row.underwriter.clone())
        .ok_or_else(|| ValidationError::InvalidUnderwriter(row.underwriter.clone()))?;

    let (code, company_name, ipo_price, listing_board, listing_date) = validate_scalars(
        &row.code,
        &row.company_name,
        row.ipo_price,
        row.listing_board.as_deref(),
        row.listing_date.as_deref(),
    )?;

    Ok(NormalizedRow {
        code,
        underwriters: vec![token],
        company_name,
        ipo_price,
        return_d1: row.return_d1,
        return_d2: row.return_d2,
        return_d3: row.return_d3,
        return_d4: row.return_d4,
        return_d5: row.return_d5,
        return_d6: row.return_d6,
        return_d7: row.return_d7,
        listing_board,
        listing_date,
        performance_note: trimmed_note(row.performance_note.as_deref()),
    })
}

fn trimmed_note(note: Option<&str>) -> Option<String> {
    note.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn validate_entry(entry: &BulkEntry) -> Result<NormalizedRow, ValidationError> {
    match entry {
        BulkEntry::Grouped(input) => validate_create(input),
        BulkEntry::Flat(row) => validate_flat(row),
    }
}

enum UpsertFailure {
    /// This candidate failed; siblings continue
    Record(String),
    /// The store itself is degraded; the batch cannot continue
    Store(StoreError),
}

fn store_failure(err: StoreError) -> UpsertFailure {
    match err {
        StoreError::Unavailable { .. } => UpsertFailure::Store(err),
        other => UpsertFailure::Record(other.to_string()),
    }
}

async fn upsert_candidate<S: DocumentStore>(
    store: &S,
    candidate: &GroupedCandidate,
    now: DateTime<Utc>,
) -> Result<(), UpsertFailure> {
    let existing = store
        .find_by_code(&candidate.code)
        .await
        .map_err(store_failure)?;

    match existing {
        None => {
            let doc = document_from_candidate(candidate, now);
            store.insert(doc).await.map_err(store_failure)
        }
        Some(existing) => {
            // Merge: union the underwriter sets, keep stored scalars
            // (first observed wins across re-ingest), bump updated_at.
            let mut merged = existing.underwriter_tokens();
            merged.extend(candidate.underwriters.iter().cloned());

            let mut patch = RecordPatch::touch(now);
            patch.underwriters = Some(grouping::canonical_underwriters(merged));

            match store.apply_patch(&existing.id, patch).await {
                Ok(Some(_)) => Ok(()),
                Ok(None) => Err(UpsertFailure::Record(
                    "record removed while the batch was running".to_string(),
                )),
                Err(err) => Err(store_failure(err)),
            }
        }
    }
}

fn document_from_candidate(candidate: &GroupedCandidate, now: DateTime<Utc>) -> StockDocument {
    StockDocument {
        id: RecordId::Native(NativeId::generate()),
        code: candidate.code.clone(),
        underwriters: Some(UnderwriterField::Many(
            candidate
                .underwriters
                .iter()
                .map(|token| token.as_str().to_string())
                .collect(),
        )),
        company_name: candidate.company_name.clone(),
        ipo_price: Some(candidate.ipo_price),
        return_d1: candidate.return_d1,
        return_d2: candidate.return_d2,
        return_d3: candidate.return_d3,
        return_d4: candidate.return_d4,
        return_d5: candidate.return_d5,
        return_d6: candidate.return_d6,
        return_d7: candidate.return_d7,
        listing_board: Some(candidate.listing_board),
        listing_date: Some(candidate.listing_date),
        performance_note: candidate.performance_note.clone(),
        created_at: now,
        updated_at: now,
    }
}

fn record_failure(errors: &mut Vec<String>, code: &str, reason: &str) {
    if errors.len() < MAX_REPORTED_ERRORS {
        errors.push(format!("failed to ingest {}: {}", code, reason));
    }
}

/// Run a bulk ingest batch against the store
///
/// Success and failure are counted per input record. Only a degraded store
/// aborts the batch; everything else is reported and the batch continues.
pub async fn run<S: DocumentStore>(
    store: &S,
    entries: Vec<BulkEntry>,
    now: DateTime<Utc>,
) -> Result<BulkReport, EngineError> {
    let mut failed = 0usize;
    let mut errors: Vec<String> = Vec::new();
    let mut rows: Vec<NormalizedRow> = Vec::new();

    for entry in &entries {
        match validate_entry(entry) {
            Ok(row) => rows.push(row),
            Err(err) => {
                failed += 1;
                record_failure(&mut errors, entry.code_label(), &err.to_string());
                tracing::warn!(code = entry.code_label(), error = %err, "rejected ingest row");
            }
        }
    }

    let mut succeeded = 0usize;
    for candidate in grouping::group_rows(rows) {
        match upsert_candidate(store, &candidate, now).await {
            Ok(()) => succeeded += candidate.source_rows,
            Err(UpsertFailure::Record(reason)) => {
                failed += candidate.source_rows;
                record_failure(&mut errors, candidate.code.as_str(), &reason);
                tracing::warn!(code = %candidate.code, error = %reason, "failed to upsert candidate");
            }
            Err(UpsertFailure::Store(err)) => return Err(err.into()),
        }
    }

    tracing::info!(succeeded, failed, "bulk ingest completed");
    Ok(BulkReport {
        succeeded,
        failed,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input(code: &str, underwriters: &[&str]) -> GroupedRecordCreate {
        GroupedRecordCreate {
            underwriters: underwriters.iter().map(|s| s.to_string()).collect(),
            code: code.to_string(),
            company_name: format!("PT {} Tbk", code),
            ipo_price: Some(Decimal::from(140)),
            return_d1: None,
            return_d2: None,
            return_d3: None,
            return_d4: None,
            return_d5: None,
            return_d6: None,
            return_d7: None,
            listing_board: Some("Akselerasi".to_string()),
            listing_date: Some("2021-12-06".to_string()),
            performance_note: None,
        }
    }

    #[test]
    fn test_parse_listing_date_formats() {
        assert!(parse_listing_date("2021-12-06").is_some());
        assert!(parse_listing_date("2021-12-06T00:00:00Z").is_some());
        assert!(parse_listing_date("2021-12-06T07:30:00+07:00").is_some());
        assert!(parse_listing_date("06/12/2021").is_none());
        assert!(parse_listing_date("soon").is_none());
    }

    #[test]
    fn test_validate_create_normalizes_tokens() {
        let row = validate_create(&create_input("goto", &["az", " lg "])).unwrap();
        assert_eq!(row.code, StockCode::new("GOTO"));
        assert_eq!(
            row.underwriters,
            vec![UnderwriterCode::new("AZ"), UnderwriterCode::new("LG")]
        );
    }

    #[test]
    fn test_validate_create_rejections() {
        let empty = create_input("GOTO", &[]);
        assert_eq!(
            validate_create(&empty),
            Err(ValidationError::EmptyUnderwriters)
        );

        let mut no_price = create_input("GOTO", &["AZ"]);
        no_price.ipo_price = None;
        assert_eq!(validate_create(&no_price), Err(ValidationError::MissingPrice));

        let mut negative = create_input("GOTO", &["AZ"]);
        negative.ipo_price = Some(Decimal::from(-10));
        assert!(matches!(
            validate_create(&negative),
            Err(ValidationError::NonPositivePrice(_))
        ));

        let mut bad_board = create_input("GOTO", &["AZ"]);
        bad_board.listing_board = Some("Nasdaq".to_string());
        assert!(matches!(
            validate_create(&bad_board),
            Err(ValidationError::UnknownListingBoard(_))
        ));

        let mut bad_date = create_input("GOTO", &["AZ"]);
        bad_date.listing_date = Some("yesterday".to_string());
        assert!(matches!(
            validate_create(&bad_date),
            Err(ValidationError::InvalidListingDate(_))
        ));

        let mut blank_company = create_input("GOTO", &["AZ"]);
        blank_company.company_name = "   ".to_string();
        assert_eq!(
            validate_create(&blank_company),
            Err(ValidationError::EmptyCompanyName)
        );
    }

    #[test]
    fn test_bulk_entry_deserializes_both_shapes() {
        let flat: BulkEntry = serde_json::from_str(
            r#"{"underwriter": "AH", "code": "WGSH", "companyName": "PT Wira Global Solusi Tbk"}"#,
        )
        .unwrap();
        assert!(matches!(flat, BulkEntry::Flat(_)));

        let grouped: BulkEntry = serde_json::from_str(
            r#"{"underwriters": ["AZ", "LG"], "code": "GOTO", "companyName": "PT GoTo Tbk"}"#,
        )
        .unwrap();
        assert!(matches!(grouped, BulkEntry::Grouped(_)));
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_not_fatal() {
        let store = crate::MemoryStore::new();
        let now = Utc::now();

        let mut bad = create_input("BAD", &["AZ"]);
        bad.ipo_price = Some(Decimal::ZERO);

        let report = run(
            &store,
            vec![
                BulkEntry::Grouped(create_input("GOTO", &["AZ"])),
                BulkEntry::Grouped(bad),
            ],
            now,
        )
        .await
        .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("BAD"));
    }

    #[tokio::test]
    async fn test_reingest_is_idempotent() {
        let store = crate::MemoryStore::new();
        let now = Utc::now();
        let batch = vec![
            BulkEntry::Grouped(create_input("GOTO", &["AZ"])),
            BulkEntry::Grouped(create_input("WGSH", &["AH"])),
        ];

        run(&store, batch.clone(), now).await.unwrap();
        run(&store, batch, now).await.unwrap();

        assert_eq!(store.len(), 2);
    }
}
