//! In-memory document store
//!
//! Backs tests and local runs. Per-document atomicity comes from the
//! sharded map: point operations lock only the touched entry, which is the
//! same consistency the engine is allowed to assume from a real document
//! store. There are no cross-document transactions.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use types::ids::{RecordId, StockCode};
use types::record::UnderwriterField;

use super::{DocumentStore, RecordPatch, StockDocument, StoreError};

/// Concurrent in-memory collection of [`StockDocument`]s
///
/// Indexed documents are additionally tracked in a code → id map that
/// enforces stock-code uniqueness on insert.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: DashMap<RecordId, StockDocument>,
    code_index: DashMap<StockCode, RecordId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without touching the unique code index
    ///
    /// Models legacy rows written before the index existed; the query-time
    /// grouping view must tolerate these alongside indexed documents.
    pub fn insert_unindexed(&self, doc: StockDocument) {
        self.docs.insert(doc.id.clone(), doc);
    }

    /// Number of stored documents (indexed and legacy)
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: StockDocument) -> Result<(), StoreError> {
        if doc.is_indexed() {
            match self.code_index.entry(doc.code.clone()) {
                Entry::Occupied(_) => {
                    return Err(StoreError::DuplicateCode {
                        code: doc.code.to_string(),
                    })
                }
                Entry::Vacant(slot) => {
                    slot.insert(doc.id.clone());
                }
            }
        }
        self.docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<StockDocument>, StoreError> {
        Ok(self.docs.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_code(&self, code: &StockCode) -> Result<Option<StockDocument>, StoreError> {
        let Some(id) = self.code_index.get(code).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }

    async fn apply_patch(
        &self,
        id: &RecordId,
        patch: RecordPatch,
    ) -> Result<Option<StockDocument>, StoreError> {
        let Some(mut doc) = self.docs.get_mut(id) else {
            return Ok(None);
        };

        if let Some(underwriters) = patch.underwriters {
            doc.underwriters = Some(UnderwriterField::Many(
                underwriters
                    .into_iter()
                    .map(|token| token.as_str().to_string())
                    .collect(),
            ));
        }
        if let Some(company_name) = patch.company_name {
            doc.company_name = company_name;
        }
        if let Some(ipo_price) = patch.ipo_price {
            doc.ipo_price = Some(ipo_price);
        }
        if let Some(value) = patch.return_d1 {
            doc.return_d1 = Some(value);
        }
        if let Some(value) = patch.return_d2 {
            doc.return_d2 = Some(value);
        }
        if let Some(value) = patch.return_d3 {
            doc.return_d3 = Some(value);
        }
        if let Some(value) = patch.return_d4 {
            doc.return_d4 = Some(value);
        }
        if let Some(value) = patch.return_d5 {
            doc.return_d5 = Some(value);
        }
        if let Some(value) = patch.return_d6 {
            doc.return_d6 = Some(value);
        }
        if let Some(value) = patch.return_d7 {
            doc.return_d7 = Some(value);
        }
        if let Some(listing_board) = patch.listing_board {
            doc.listing_board = Some(listing_board);
        }
        if let Some(listing_date) = patch.listing_date {
            doc.listing_date = Some(listing_date);
        }
        if let Some(performance_note) = patch.performance_note {
            doc.performance_note = Some(performance_note);
        }
        doc.updated_at = patch.updated_at;

        Ok(Some(doc.value().clone()))
    }

    async fn delete_by_id(&self, id: &RecordId) -> Result<bool, StoreError> {
        match self.docs.remove(id) {
            Some((_, doc)) => {
                if doc.is_indexed() {
                    self.code_index
                        .remove_if(&doc.code, |_, indexed| indexed == id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn scan(&self) -> Result<Vec<StockDocument>, StoreError> {
        Ok(self.docs.iter().map(|entry| entry.value().clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(code: &str, underwriters: &[&str]) -> StockDocument {
        let now = Utc::now();
        StockDocument {
            id: RecordId::token(),
            code: StockCode::new(code),
            underwriters: Some(UnderwriterField::Many(
                underwriters.iter().map(|s| s.to_string()).collect(),
            )),
            company_name: format!("PT {} Tbk", code),
            ipo_price: Some(100.into()),
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
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_code() {
        let store = MemoryStore::new();
        store.insert(doc("GOTO", &["AZ"])).await.unwrap();

        let found = store
            .find_by_code(&StockCode::new("GOTO"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.code, StockCode::new("GOTO"));
    }

    #[tokio::test]
    async fn test_insert_duplicate_code_rejected() {
        let store = MemoryStore::new();
        store.insert(doc("GOTO", &["AZ"])).await.unwrap();

        let err = store.insert(doc("GOTO", &["LG"])).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateCode {
                code: "GOTO".to_string()
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unindexed_rows_bypass_uniqueness() {
        let store = MemoryStore::new();
        store.insert(doc("GOTO", &["AZ"])).await.unwrap();

        let mut legacy = doc("GOTO", &[]);
        legacy.underwriters = Some(UnderwriterField::Single("LG".to_string()));
        store.insert_unindexed(legacy);

        assert_eq!(store.len(), 2);
        assert_eq!(store.scan().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_clears_code_index() {
        let store = MemoryStore::new();
        let document = doc("GOTO", &["AZ"]);
        let id = document.id.clone();
        store.insert(document).await.unwrap();

        assert!(store.delete_by_id(&id).await.unwrap());
        assert!(!store.delete_by_id(&id).await.unwrap());

        // Code is free again after the delete
        store.insert(doc("GOTO", &["LG"])).await.unwrap();
    }

    #[tokio::test]
    async fn test_patch_replaces_only_supplied_fields() {
        let store = MemoryStore::new();
        let document = doc("GOTO", &["AZ"]);
        let id = document.id.clone();
        let created_company = document.company_name.clone();
        store.insert(document).await.unwrap();

        let now = Utc::now();
        let mut patch = RecordPatch::touch(now);
        patch.ipo_price = Some(338.into());

        let updated = store.apply_patch(&id, patch).await.unwrap().unwrap();
        assert_eq!(updated.ipo_price, Some(338.into()));
        assert_eq!(updated.company_name, created_company);
        assert_eq!(updated.updated_at, now);
    }

    #[tokio::test]
    async fn test_patch_missing_document_is_none() {
        let store = MemoryStore::new();
        let missing = RecordId::token();
        let patch = RecordPatch::touch(Utc::now());
        assert!(store.apply_patch(&missing, patch).await.unwrap().is_none());
    }
}
