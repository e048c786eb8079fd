//! Service facade implementing the logical record contract
//!
//! Constructed once with its store handle and handed to the routing layer
//! (explicit dependency injection; nothing is looked up through a global).
//! All operations are async and rely only on the store's per-document
//! atomicity; grouping and statistics reads are best-effort snapshots under
//! concurrent writes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use types::errors::{EngineError, ValidationError};
use types::ids::{RecordId, UnderwriterCode};
use types::record::{
    BulkReport, GroupedRecordCreate, GroupedRecordUpdate, GroupedStockRecord, ListResponse,
    StatsSnapshot, UnderwriterActivity, UnderwriterField,
};

use crate::grouping;
use crate::ingest::{self, BulkEntry};
use crate::search::{self, SearchQuery};
use crate::stats;
use crate::store::{DocumentStore, RecordPatch, StockDocument};

/// The record-grouping engine behind every API operation
pub struct UnderwritingService<S> {
    store: S,
}

impl<S: DocumentStore> UnderwritingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current grouped view of the whole collection
    async fn grouped_view(&self) -> Result<Vec<GroupedStockRecord>, EngineError> {
        let docs = self.store.scan().await?;
        Ok(grouping::group_documents(docs))
    }

    /// List/search the grouped view
    ///
    /// Pipeline order is load → group → filter → sort → paginate; `total`
    /// reflects the filtered set, not the pre-filter count.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<ListResponse, EngineError> {
        let query = SearchQuery::parse(search);
        let grouped = self.grouped_view().await?;

        let mut filtered = search::filter_records(grouped, &query);
        let total = filtered.len();

        search::sort_by_listing_date_desc(&mut filtered);
        let records = search::paginate(filtered, search::clamp_limit(limit), offset);

        Ok(ListResponse {
            count: records.len(),
            total,
            records,
        })
    }

    /// Create a grouped record directly, with a generated token id
    ///
    /// An existing stock code is a conflict, not a merge.
    pub async fn create(
        &self,
        input: GroupedRecordCreate,
    ) -> Result<GroupedStockRecord, EngineError> {
        let row = ingest::validate_create(&input)?;
        let now = Utc::now();

        let doc = StockDocument {
            id: RecordId::token(),
            code: row.code,
            underwriters: Some(UnderwriterField::Many(
                grouping::canonical_underwriters(row.underwriters)
                    .into_iter()
                    .map(|token| token.as_str().to_string())
                    .collect(),
            )),
            company_name: row.company_name,
            ipo_price: Some(row.ipo_price),
            return_d1: row.return_d1,
            return_d2: row.return_d2,
            return_d3: row.return_d3,
            return_d4: row.return_d4,
            return_d5: row.return_d5,
            return_d6: row.return_d6,
            return_d7: row.return_d7,
            listing_board: Some(row.listing_board),
            listing_date: Some(row.listing_date),
            performance_note: row.performance_note,
            created_at: now,
            updated_at: now,
        };

        self.store.insert(doc.clone()).await?;
        tracing::info!(code = %doc.code, "created record");
        Ok(doc.into_grouped())
    }

    /// Fetch one record by handle, whichever identifier form it uses
    pub async fn get(&self, raw_id: &str) -> Result<GroupedStockRecord, EngineError> {
        let id = RecordId::resolve(raw_id);
        let doc = self
            .store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| EngineError::not_found(raw_id))?;
        Ok(doc.into_grouped())
    }

    /// Apply a partial update; an empty patch is a no-op
    pub async fn update(
        &self,
        raw_id: &str,
        update: GroupedRecordUpdate,
    ) -> Result<GroupedStockRecord, EngineError> {
        let id = RecordId::resolve(raw_id);

        if update.is_empty() {
            let doc = self
                .store
                .find_by_id(&id)
                .await?
                .ok_or_else(|| EngineError::not_found(raw_id))?;
            return Ok(doc.into_grouped());
        }

        let patch = patch_from_update(update, Utc::now())?;
        let doc = self
            .store
            .apply_patch(&id, patch)
            .await?
            .ok_or_else(|| EngineError::not_found(raw_id))?;

        tracing::info!(id = %id, "updated record");
        Ok(doc.into_grouped())
    }

    /// Delete one record by handle
    pub async fn delete(&self, raw_id: &str) -> Result<(), EngineError> {
        let id = RecordId::resolve(raw_id);
        if self.store.delete_by_id(&id).await? {
            tracing::info!(id = %id, "deleted record");
            Ok(())
        } else {
            Err(EngineError::not_found(raw_id))
        }
    }

    /// Ingest a batch of flat or grouped-shaped records
    pub async fn bulk_upsert(&self, entries: Vec<BulkEntry>) -> Result<BulkReport, EngineError> {
        ingest::run(&self.store, entries, Utc::now()).await
    }

    /// Cross-cutting counts over the current grouped view
    pub async fn stats(&self) -> Result<StatsSnapshot, EngineError> {
        let grouped = self.grouped_view().await?;
        Ok(stats::compute(&grouped))
    }

    /// Per-underwriter participation counts over the current grouped view
    pub async fn underwriter_activity(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<UnderwriterActivity>, EngineError> {
        let grouped = self.grouped_view().await?;
        Ok(stats::underwriter_activity(&grouped, search))
    }
}

/// Validate a partial update into a store patch
///
/// Supplied underwriter lists are re-normalized; the stock code is not
/// patchable (the grouping key is stable for the lifetime of a record).
fn patch_from_update(
    update: GroupedRecordUpdate,
    now: DateTime<Utc>,
) -> Result<RecordPatch, ValidationError> {
    let mut patch = RecordPatch::touch(now);

    if let Some(raw_list) = update.underwriters {
        if raw_list.is_empty() {
            return Err(ValidationError::EmptyUnderwriters);
        }
        let mut tokens = Vec::with_capacity(raw_list.len());
        for raw in raw_list {
            let token = UnderwriterCode::try_new(raw.clone())
                .ok_or(ValidationError::InvalidUnderwriter(raw))?;
            tokens.push(token);
        }
        patch.underwriters = Some(grouping::canonical_underwriters(tokens));
    }

    if let Some(name) = update.company_name {
        let trimmed = name.trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCompanyName);
        }
        patch.company_name = Some(trimmed);
    }

    if let Some(price) = update.ipo_price {
        if price <= Decimal::ZERO {
            return Err(ValidationError::NonPositivePrice(price.to_string()));
        }
        patch.ipo_price = Some(price);
    }

    patch.return_d1 = update.return_d1;
    patch.return_d2 = update.return_d2;
    patch.return_d3 = update.return_d3;
    patch.return_d4 = update.return_d4;
    patch.return_d5 = update.return_d5;
    patch.return_d6 = update.return_d6;
    patch.return_d7 = update.return_d7;

    if let Some(board_raw) = update.listing_board {
        let board = board_raw
            .parse()
            .map_err(|_| ValidationError::UnknownListingBoard(board_raw))?;
        patch.listing_board = Some(board);
    }

    if let Some(date_raw) = update.listing_date {
        let date = ingest::parse_listing_date(&date_raw)
            .ok_or(ValidationError::InvalidListingDate(date_raw))?;
        patch.listing_date = Some(date);
    }

    patch.performance_note = update.performance_note;

    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_normalizes_underwriters() {
        let update = GroupedRecordUpdate {
            underwriters: Some(vec!["lg".to_string(), "AZ".to_string(), "az".to_string()]),
            ..Default::default()
        };

        let patch = patch_from_update(update, Utc::now()).unwrap();
        assert_eq!(
            patch.underwriters,
            Some(vec![UnderwriterCode::new("AZ"), UnderwriterCode::new("LG")])
        );
    }

    #[test]
    fn test_patch_rejects_empty_underwriter_list() {
        let update = GroupedRecordUpdate {
            underwriters: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            patch_from_update(update, Utc::now()),
            Err(ValidationError::EmptyUnderwriters)
        );
    }

    #[test]
    fn test_patch_rejects_bad_price_and_board() {
        let update = GroupedRecordUpdate {
            ipo_price: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(matches!(
            patch_from_update(update, Utc::now()),
            Err(ValidationError::NonPositivePrice(_))
        ));

        let update = GroupedRecordUpdate {
            listing_board: Some("NYSE".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            patch_from_update(update, Utc::now()),
            Err(ValidationError::UnknownListingBoard(_))
        ));
    }
}
