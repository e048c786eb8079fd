//! Document store seam
//!
//! The engine depends on the *query shapes* it issues, not on a
//! concrete database: single-document point operations (atomic per
//! document), a unique-index insert keyed by stock code, a `$set`-style
//! field patch, and a full-collection scan feeding query-time grouping.
//! [`memory::MemoryStore`] implements the seam for tests and local use; a
//! store against a real document database implements the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::errors::EngineError;
use types::ids::{RecordId, StockCode, UnderwriterCode};
use types::record::{GroupedStockRecord, ListingBoard, UnderwriterField};

use crate::grouping;

pub mod memory;

/// Persisted document shape
///
/// One logical collection holds these. Documents written by this engine
/// always carry the array form of `underwriters`; legacy rows may carry a
/// scalar, or nothing at all, and are tolerated by the query-time grouping
/// view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDocument {
    pub id: RecordId,
    pub code: StockCode,
    pub underwriters: Option<UnderwriterField>,
    pub company_name: String,
    pub ipo_price: Option<Decimal>,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: Option<ListingBoard>,
    pub listing_date: Option<DateTime<Utc>>,
    pub performance_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockDocument {
    /// Whether this document participates in the unique stock-code index
    ///
    /// Only array-form documents do; legacy scalar rows predate the index.
    pub fn is_indexed(&self) -> bool {
        matches!(self.underwriters, Some(UnderwriterField::Many(_)))
    }

    /// Uniform token sequence for this document's underwriter field
    ///
    /// A null or missing field yields an empty sequence, never a null token.
    pub fn underwriter_tokens(&self) -> Vec<UnderwriterCode> {
        self.underwriters
            .as_ref()
            .map(UnderwriterField::tokens)
            .unwrap_or_default()
    }

    /// Materialize this single document as a grouped record
    ///
    /// The underwriter set is canonicalized on the way out; grouping across
    /// documents sharing a code is [`grouping::group_documents`]' job.
    pub fn into_grouped(self) -> GroupedStockRecord {
        let underwriters = grouping::canonical_underwriters(self.underwriter_tokens());
        GroupedStockRecord {
            id: self.id,
            code: self.code,
            underwriters,
            company_name: self.company_name,
            ipo_price: self.ipo_price,
            return_d1: self.return_d1,
            return_d2: self.return_d2,
            return_d3: self.return_d3,
            return_d4: self.return_d4,
            return_d5: self.return_d5,
            return_d6: self.return_d6,
            return_d7: self.return_d7,
            listing_board: self.listing_board,
            listing_date: self.listing_date,
            performance_note: self.performance_note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// `$set`-style single-document field update
///
/// `None` leaves a field untouched. `updated_at` is always written.
/// The stock code is deliberately absent: the grouping key is stable for
/// the lifetime of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatch {
    pub underwriters: Option<Vec<UnderwriterCode>>,
    pub company_name: Option<String>,
    pub ipo_price: Option<Decimal>,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: Option<ListingBoard>,
    pub listing_date: Option<DateTime<Utc>>,
    pub performance_note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl RecordPatch {
    /// An empty patch that only bumps `updated_at`
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            underwriters: None,
            company_name: None,
            ipo_price: None,
            return_d1: None,
            return_d2: None,
            return_d3: None,
            return_d4: None,
            return_d5: None,
            return_d6: None,
            return_d7: None,
            listing_board: None,
            listing_date: None,
            performance_note: None,
            updated_at,
        }
    }
}

/// Store-level failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("duplicate stock code: {code}")]
    DuplicateCode { code: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode { code } => EngineError::Conflict { code },
            StoreError::Unavailable { reason } => EngineError::StoreUnavailable { reason },
        }
    }
}

/// The query shapes the engine issues to its document store
///
/// Every operation is atomic per document; there are no cross-document
/// transactions. Implementations must enforce stock-code uniqueness across
/// indexed documents on [`DocumentStore::insert`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document, rejecting a duplicate code on an indexed document
    async fn insert(&self, doc: StockDocument) -> Result<(), StoreError>;

    /// Point read by identifier
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<StockDocument>, StoreError>;

    /// Unique-index lookup over indexed documents
    async fn find_by_code(&self, code: &StockCode) -> Result<Option<StockDocument>, StoreError>;

    /// Apply a field patch to one document, returning the new document
    async fn apply_patch(
        &self,
        id: &RecordId,
        patch: RecordPatch,
    ) -> Result<Option<StockDocument>, StoreError>;

    /// Delete one document, returning whether it existed
    async fn delete_by_id(&self, id: &RecordId) -> Result<bool, StoreError>;

    /// Read the whole collection (feeds query-time grouping)
    async fn scan(&self) -> Result<Vec<StockDocument>, StoreError>;
}
