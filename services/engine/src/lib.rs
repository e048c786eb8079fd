//! Record-Grouping and Aggregation Engine
//!
//! Ingests flat, one-row-per-underwriter source records and materializes
//! them into one canonical, deduplicated record per stock code, then answers
//! search and statistics queries against that materialized view.
//!
//! # Architecture
//!
//! ```text
//! flat rows ──► Bulk Ingest ──► grouped documents (unique stock code)
//!                                       │
//!                              ┌────────▼────────┐
//!                              │  Grouping View  │ ← normalize, unwind, group
//!                              └────────┬────────┘
//!                          ┌────────────┼────────────┐
//!                     ┌────▼───┐   ┌────▼────┐  ┌────▼────┐
//!                     │ Search │   │  Stats  │  │  CRUD   │
//!                     └────────┘   └─────────┘  └─────────┘
//! ```
//!
//! Search filters on group membership strictly *after* grouping: matching
//! flat rows first would drop multi-underwriter stocks whenever the searched
//! token is not the representative row.

pub mod grouping;
pub mod ingest;
pub mod search;
pub mod service;
pub mod stats;
pub mod store;

pub use service::UnderwritingService;
pub use store::memory::MemoryStore;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
