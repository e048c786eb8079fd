//! Identifier types for underwriting records
//!
//! Records reach the collection through two historical paths: direct creates
//! mint an application token (a UUID string), while bulk-ingested documents
//! carry the store's native fixed-format handle. [`RecordId`] models both
//! forms as a closed variant resolved once at the boundary, so lookups,
//! updates, and deletes are identifier-format-agnostic for every caller.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of stock and underwriter codes.
pub const MAX_CODE_LEN: usize = 10;

/// Rendered length of a store-native identifier (12 bytes as hex).
pub const NATIVE_ID_LEN: usize = 24;

/// Stock code, the grouping key
///
/// Short exchange ticker (e.g. "GOTO", "WGSH"). Stored upper-cased; at most
/// one grouped record exists per code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockCode(String);

impl StockCode {
    /// Create a new StockCode
    ///
    /// # Panics
    /// Panics if the code is empty or longer than [`MAX_CODE_LEN`]
    pub fn new(code: impl Into<String>) -> Self {
        Self::try_new(code).expect("stock code must be 1-10 characters")
    }

    /// Try to create a StockCode, returning None if invalid
    pub fn try_new(code: impl Into<String>) -> Option<Self> {
        let s = code.into().trim().to_uppercase();
        if s.is_empty() || s.len() > MAX_CODE_LEN {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the code string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Underwriter token
///
/// Short code identifying an underwriting firm (e.g. "AZ", "LG").
/// Stored upper-cased so case-variant duplicates collapse on comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnderwriterCode(String);

impl UnderwriterCode {
    /// Create a new UnderwriterCode
    ///
    /// # Panics
    /// Panics if the token is empty or longer than [`MAX_CODE_LEN`]
    pub fn new(token: impl Into<String>) -> Self {
        Self::try_new(token).expect("underwriter token must be 1-10 characters")
    }

    /// Try to create an UnderwriterCode, returning None if invalid
    pub fn try_new(token: impl Into<String>) -> Option<Self> {
        let s = token.into().trim().to_uppercase();
        if s.is_empty() || s.len() > MAX_CODE_LEN {
            None
        } else {
            Some(Self(s))
        }
    }

    /// Get the token string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnderwriterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-native document handle: 12 bytes rendered as 24 hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId([u8; 12]);

static NATIVE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Error parsing a string as a store-native identifier
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseNativeIdError {
    #[error("expected {NATIVE_ID_LEN} characters, got {0}")]
    InvalidLength(usize),

    #[error("not a hexadecimal string")]
    InvalidHex,
}

impl NativeId {
    /// Mint a fresh handle
    ///
    /// Layout mirrors the store's own ids: a 4-byte unix-seconds prefix
    /// followed by an 8-byte process-local counter.
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0) as u32;
        let count = NATIVE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&count.to_be_bytes());
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Parse the 24-character hex rendering
    pub fn parse_str(s: &str) -> Result<Self, ParseNativeIdError> {
        if s.len() != NATIVE_ID_LEN {
            return Err(ParseNativeIdError::InvalidLength(s.len()));
        }
        if !s.is_ascii() {
            return Err(ParseNativeIdError::InvalidHex);
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseNativeIdError::InvalidHex)?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl Serialize for NativeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NativeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        NativeId::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque record handle in whichever form a document actually uses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// Store-native fixed-format handle (bulk-ingested documents)
    Native(NativeId),
    /// Application-generated token, typically a UUID (direct creates)
    Token(String),
}

impl RecordId {
    /// Mint a fresh generated token id
    pub fn token() -> Self {
        Self::Token(Uuid::now_v7().to_string())
    }

    /// Normalize an externally supplied handle into the form it matches
    ///
    /// A 24-character string that parses as hex is treated as store-native;
    /// anything else falls back to an opaque token key. Callers never learn
    /// which form was attempted.
    pub fn resolve(raw: &str) -> Self {
        if raw.len() == NATIVE_ID_LEN {
            if let Ok(native) = NativeId::parse_str(raw) {
                return Self::Native(native);
            }
        }
        Self::Token(raw.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Native(native) => write!(f, "{}", native),
            RecordId::Token(token) => write!(f, "{}", token),
        }
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(RecordId::resolve(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_code_normalization() {
        let code = StockCode::new(" goto ");
        assert_eq!(code.as_str(), "GOTO");
    }

    #[test]
    fn test_stock_code_try_new() {
        assert!(StockCode::try_new("WGSH").is_some());
        assert!(StockCode::try_new("").is_none());
        assert!(StockCode::try_new("   ").is_none());
        assert!(StockCode::try_new("WAYTOOLONGCODE").is_none());
    }

    #[test]
    #[should_panic(expected = "stock code must be 1-10 characters")]
    fn test_stock_code_invalid_panics() {
        StockCode::new("");
    }

    #[test]
    fn test_underwriter_code_collapses_case() {
        assert_eq!(UnderwriterCode::new("az"), UnderwriterCode::new("AZ"));
    }

    #[test]
    fn test_native_id_generation_unique() {
        let id1 = NativeId::generate();
        let id2 = NativeId::generate();
        assert_ne!(id1, id2, "NativeIds should be unique");
    }

    #[test]
    fn test_native_id_display_roundtrip() {
        let id = NativeId::generate();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), NATIVE_ID_LEN);
        assert_eq!(NativeId::parse_str(&rendered).unwrap(), id);
    }

    #[test]
    fn test_native_id_rejects_bad_input() {
        assert_eq!(
            NativeId::parse_str("abc"),
            Err(ParseNativeIdError::InvalidLength(3))
        );
        assert_eq!(
            NativeId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz"),
            Err(ParseNativeIdError::InvalidHex)
        );
    }

    #[test]
    fn test_resolve_native_form() {
        let native = NativeId::generate();
        let resolved = RecordId::resolve(&native.to_string());
        assert_eq!(resolved, RecordId::Native(native));
    }

    #[test]
    fn test_resolve_token_form() {
        let token = RecordId::token();
        let rendered = token.to_string();
        assert_eq!(RecordId::resolve(&rendered), token);
    }

    #[test]
    fn test_resolve_24_char_non_hex_is_token() {
        let raw = "ghijklmnopqrstuvwxyzabcd";
        assert_eq!(raw.len(), NATIVE_ID_LEN);
        assert_eq!(RecordId::resolve(raw), RecordId::Token(raw.to_string()));
    }

    #[test]
    fn test_record_id_serialization() {
        let id = RecordId::Native(NativeId::generate());
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);

        let token = RecordId::token();
        let json = serde_json::to_string(&token).unwrap();
        let deserialized: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(token, deserialized);
    }
}
