use grouping_engine::ingest::BulkEntry;
use serde::{Deserialize, Serialize};
use types::record::UnderwriterActivity;

/// Query parameters for listing/searching the grouped view
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// Query parameters for the underwriter activity listing
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityQuery {
    pub search: Option<String>,
}

/// Bulk upload request body
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUploadRequest {
    pub data: Vec<BulkEntry>,
}

/// Underwriter activity listing with its total
#[derive(Debug, Clone, Serialize)]
pub struct UnderwriterListResponse {
    pub data: Vec<UnderwriterActivity>,
    pub total: usize,
}

/// Simple message response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
