//! Underwriting record types
//!
//! Two shapes exist for the same domain: the flat one-row-per-underwriter
//! form produced by external imports, and the canonical grouped form with
//! one record per stock code. Grouping collapses N flat rows into one
//! [`GroupedStockRecord`] whose underwriter set is upper-cased,
//! deduplicated, and sorted for deterministic comparison and display.

use crate::ids::{RecordId, StockCode, UnderwriterCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing board of the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingBoard {
    /// Main board
    #[serde(rename = "Utama")]
    Utama,
    /// Development board
    #[serde(rename = "Pengembangan")]
    Pengembangan,
    /// Acceleration board
    #[serde(rename = "Akselerasi")]
    Akselerasi,
}

impl ListingBoard {
    /// All known boards
    pub fn all() -> &'static [ListingBoard] {
        &[
            ListingBoard::Utama,
            ListingBoard::Pengembangan,
            ListingBoard::Akselerasi,
        ]
    }

    /// Exchange spelling of this board
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingBoard::Utama => "Utama",
            ListingBoard::Pengembangan => "Pengembangan",
            ListingBoard::Akselerasi => "Akselerasi",
        }
    }
}

impl fmt::Display for ListingBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListingBoard {
    type Err = ();

    /// Case-insensitive parse of the exchange spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ListingBoard::all()
            .iter()
            .copied()
            .find(|board| board.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Underwriter representation as it actually appears in stored documents
///
/// Source data is inconsistent: a document may carry a single scalar token
/// or an array of tokens. Both shapes are tolerated here and converted to a
/// uniform sequence by [`UnderwriterField::tokens`]; nothing deeper in the
/// pipeline branches on shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnderwriterField {
    /// Array form (grouped documents)
    Many(Vec<String>),
    /// Scalar form (legacy flat rows)
    Single(String),
}

impl UnderwriterField {
    /// Convert to a uniform, case-normalized token sequence
    ///
    /// Blank entries are dropped rather than inserted as empty tokens.
    pub fn tokens(&self) -> Vec<UnderwriterCode> {
        match self {
            UnderwriterField::Many(raw) => raw
                .iter()
                .filter_map(|token| UnderwriterCode::try_new(token.as_str()))
                .collect(),
            UnderwriterField::Single(raw) => UnderwriterCode::try_new(raw.as_str())
                .into_iter()
                .collect(),
        }
    }
}

/// One ingested row: a single underwriter's participation in one IPO
///
/// Produced by external imports. Multiple flat records may share a stock
/// code (one per participating underwriter); their scalar fields are assumed
/// identical across rows, an invariant of the source data that is not
/// enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatUnderwritingRecord {
    pub underwriter: String,
    pub code: String,
    pub company_name: String,
    pub ipo_price: Option<Decimal>,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: Option<String>,
    pub listing_date: Option<String>,
    pub performance_note: Option<String>,
}

/// Canonical per-stock record, the unit of reporting
///
/// `underwriters` is always upper-cased, duplicate-free, and sorted
/// ascending. Scalar fields other than `code` and `company_name` are
/// optional so the query-time grouped view can represent degenerate legacy
/// rows; records admitted through create or bulk ingest always carry a
/// price and a listing date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedStockRecord {
    pub id: RecordId,
    pub code: StockCode,
    pub underwriters: Vec<UnderwriterCode>,
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

impl GroupedStockRecord {
    /// Case-insensitive exact-token membership test over the underwriter set
    pub fn has_underwriter(&self, token: &UnderwriterCode) -> bool {
        self.underwriters.contains(token)
    }
}

/// Input for creating a grouped record directly
///
/// Fields arrive as raw strings and are validated and normalized by the
/// engine before anything is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRecordCreate {
    pub underwriters: Vec<String>,
    pub code: String,
    pub company_name: String,
    pub ipo_price: Option<Decimal>,
    #[serde(default)]
    pub return_d1: Option<Decimal>,
    #[serde(default)]
    pub return_d2: Option<Decimal>,
    #[serde(default)]
    pub return_d3: Option<Decimal>,
    #[serde(default)]
    pub return_d4: Option<Decimal>,
    #[serde(default)]
    pub return_d5: Option<Decimal>,
    #[serde(default)]
    pub return_d6: Option<Decimal>,
    #[serde(default)]
    pub return_d7: Option<Decimal>,
    pub listing_board: Option<String>,
    pub listing_date: Option<String>,
    #[serde(default)]
    pub performance_note: Option<String>,
}

/// Partial update of a grouped record
///
/// `None` leaves a field unchanged; a supplied underwriter list replaces the
/// stored set and is re-normalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GroupedRecordUpdate {
    pub underwriters: Option<Vec<String>>,
    pub company_name: Option<String>,
    pub ipo_price: Option<Decimal>,
    pub return_d1: Option<Decimal>,
    pub return_d2: Option<Decimal>,
    pub return_d3: Option<Decimal>,
    pub return_d4: Option<Decimal>,
    pub return_d5: Option<Decimal>,
    pub return_d6: Option<Decimal>,
    pub return_d7: Option<Decimal>,
    pub listing_board: Option<String>,
    pub listing_date: Option<String>,
    pub performance_note: Option<String>,
}

impl GroupedRecordUpdate {
    /// True when no field is set (the update is a no-op)
    pub fn is_empty(&self) -> bool {
        self == &GroupedRecordUpdate::default()
    }
}

/// Page of grouped records with pagination totals
///
/// `total` counts the full filtered set; `count` counts this page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub records: Vec<GroupedStockRecord>,
    pub count: usize,
    pub total: usize,
}

/// Outcome of a bulk ingest batch
///
/// The batch is not atomic: per-record failures are collected here and
/// never abort sibling records. `errors` is bounded to keep the report
/// small; `failed` still counts every failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Cross-cutting counts over the grouped view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_stocks: usize,
    pub total_underwriters: usize,
    pub total_companies: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// One underwriter's IPO participation count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderwriterActivity {
    pub code: UnderwriterCode,
    pub ipo_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_board_parse() {
        assert_eq!("Utama".parse::<ListingBoard>(), Ok(ListingBoard::Utama));
        assert_eq!(
            "akselerasi".parse::<ListingBoard>(),
            Ok(ListingBoard::Akselerasi)
        );
        assert_eq!(
            " PENGEMBANGAN ".parse::<ListingBoard>(),
            Ok(ListingBoard::Pengembangan)
        );
        assert!("Nasdaq".parse::<ListingBoard>().is_err());
    }

    #[test]
    fn test_listing_board_serialization() {
        let json = serde_json::to_string(&ListingBoard::Utama).unwrap();
        assert_eq!(json, "\"Utama\"");
        let board: ListingBoard = serde_json::from_str("\"Akselerasi\"").unwrap();
        assert_eq!(board, ListingBoard::Akselerasi);
    }

    #[test]
    fn test_underwriter_field_scalar_form() {
        let field: UnderwriterField = serde_json::from_str("\"az\"").unwrap();
        assert_eq!(field, UnderwriterField::Single("az".to_string()));
        assert_eq!(field.tokens(), vec![UnderwriterCode::new("AZ")]);
    }

    #[test]
    fn test_underwriter_field_array_form() {
        let field: UnderwriterField = serde_json::from_str("[\"az\", \"LG\"]").unwrap();
        assert_eq!(
            field.tokens(),
            vec![UnderwriterCode::new("AZ"), UnderwriterCode::new("LG")]
        );
    }

    #[test]
    fn test_underwriter_field_drops_blank_entries() {
        let field = UnderwriterField::Many(vec![
            "AZ".to_string(),
            "".to_string(),
            "   ".to_string(),
        ]);
        assert_eq!(field.tokens(), vec![UnderwriterCode::new("AZ")]);

        let blank = UnderwriterField::Single("  ".to_string());
        assert!(blank.tokens().is_empty());
    }

    #[test]
    fn test_flat_record_wire_names() {
        let json = r#"{
            "underwriter": "AH",
            "code": "WGSH",
            "companyName": "PT Wira Global Solusi Tbk",
            "ipoPrice": "140",
            "returnD1": "0.1",
            "listingBoard": "Akselerasi",
            "listingDate": "2021-12-06T00:00:00Z",
            "performanceNote": "ARA 5x"
        }"#;
        let record: FlatUnderwritingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.underwriter, "AH");
        assert_eq!(record.code, "WGSH");
        assert_eq!(record.ipo_price, Some(Decimal::from(140)));
        assert_eq!(record.return_d2, None);
    }

    #[test]
    fn test_grouped_record_membership() {
        let record = GroupedStockRecord {
            id: RecordId::token(),
            code: StockCode::new("GOTO"),
            underwriters: vec![UnderwriterCode::new("AZ"), UnderwriterCode::new("LG")],
            company_name: "PT GoTo Gojek Tokopedia Tbk".to_string(),
            ipo_price: Some(Decimal::from(338)),
            return_d1: None,
            return_d2: None,
            return_d3: None,
            return_d4: None,
            return_d5: None,
            return_d6: None,
            return_d7: None,
            listing_board: Some(ListingBoard::Utama),
            listing_date: None,
            performance_note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(record.has_underwriter(&UnderwriterCode::new("az")));
        assert!(!record.has_underwriter(&UnderwriterCode::new("XA")));
    }

    #[test]
    fn test_grouped_record_serialization_roundtrip() {
        let record = GroupedStockRecord {
            id: RecordId::token(),
            code: StockCode::new("GOTO"),
            underwriters: vec![UnderwriterCode::new("AZ")],
            company_name: "PT GoTo Gojek Tokopedia Tbk".to_string(),
            ipo_price: Some(Decimal::from(338)),
            return_d1: Some("0.13".parse().unwrap()),
            return_d2: None,
            return_d3: None,
            return_d4: None,
            return_d5: None,
            return_d6: None,
            return_d7: None,
            listing_board: Some(ListingBoard::Utama),
            listing_date: Some(Utc::now()),
            performance_note: Some("ARA".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"companyName\""));
        assert!(json.contains("\"ipoPrice\""));

        let deserialized: GroupedStockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(GroupedRecordUpdate::default().is_empty());

        let update = GroupedRecordUpdate {
            company_name: Some("PT Baru Tbk".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
