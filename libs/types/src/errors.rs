//! Error taxonomy for the underwriting record engine
//!
//! Per-record errors inside a batch are collected and reported
//! structurally; single-record errors propagate as these typed outcomes.
//! Empty search results and empty-collection statistics are valid values,
//! never errors.

use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("record with code {code} already exists")]
    Conflict { code: String },

    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("document store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

impl EngineError {
    /// Uniform not-found outcome, identical across identifier formats
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        EngineError::NotFound { id: id.to_string() }
    }
}

/// Malformed or missing required field on create or ingest
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("underwriter list is empty")]
    EmptyUnderwriters,

    #[error("invalid underwriter token: {0:?}")]
    InvalidUnderwriter(String),

    #[error("invalid stock code: {0:?}")]
    InvalidStockCode(String),

    #[error("company name is empty")]
    EmptyCompanyName,

    #[error("IPO price is required")]
    MissingPrice,

    #[error("IPO price must be positive, got {0}")]
    NonPositivePrice(String),

    #[error("listing board is required")]
    MissingListingBoard,

    #[error("unknown listing board: {0:?}")]
    UnknownListingBoard(String),

    #[error("listing date is required")]
    MissingListingDate,

    #[error("unparseable listing date: {0:?}")]
    InvalidListingDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::NonPositivePrice("-10".to_string());
        assert_eq!(err.to_string(), "IPO price must be positive, got -10");
    }

    #[test]
    fn test_engine_error_from_validation() {
        let err: EngineError = ValidationError::EmptyUnderwriters.into();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "validation failed: underwriter list is empty"
        );
    }

    #[test]
    fn test_not_found_is_uniform_across_formats() {
        let from_native = EngineError::not_found("64a1f2c3d4e5f60718293a4b");
        let from_token = EngineError::not_found("64a1f2c3d4e5f60718293a4b");
        assert_eq!(from_native, from_token);
    }
}
