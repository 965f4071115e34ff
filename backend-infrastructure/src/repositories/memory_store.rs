use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::{Collection, Filter, RecordStore, Row, StoreError};

use super::tables::Tables;

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        self.tables.write().await.insert(collection, row)
    }

    async fn select_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Row>, StoreError> {
        Ok(self.tables.read().await.select_one(collection, filter))
    }

    async fn select_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        Ok(self.tables.read().await.select_many(collection, filter, limit))
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Row,
    ) -> Result<Option<Row>, StoreError> {
        self.tables.write().await.update(collection, filter, patch)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self.tables.write().await.delete(collection, filter))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().cloned().expect("object")
    }

    #[tokio::test]
    async fn conditional_update_applies_once() {
        let store = MemoryRecordStore::new();
        store
            .insert(
                Collection::Joins,
                row(json!({"id": "j1", "user_id": "u1", "event_id": "e1", "checked_in_at": null})),
            )
            .await
            .expect("insert");

        let guard = Filter::new()
            .eq("user_id", "u1")
            .eq("event_id", "e1")
            .is_null("checked_in_at");
        let patch = row(json!({"checked_in_at": "2026-03-02T09:00:00Z"}));
        let first = store
            .update(Collection::Joins, &guard, patch.clone())
            .await
            .expect("update");
        assert!(first.is_some());
        let second = store
            .update(Collection::Joins, &guard, patch)
            .await
            .expect("update");
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn duplicate_join_is_a_unique_violation() {
        let store = MemoryRecordStore::new();
        store
            .insert(Collection::Joins, row(json!({"id": "j1", "user_id": "u1", "event_id": "e1"})))
            .await
            .expect("insert");
        let err = store
            .insert(Collection::Joins, row(json!({"id": "j2", "user_id": "u1", "event_id": "e1"})))
            .await
            .expect_err("duplicate pair");
        assert!(matches!(err, StoreError::UniqueViolation { collection: Collection::Joins, .. }));
        let removed = store
            .delete(Collection::Joins, &Filter::new().eq("id", "j1"))
            .await
            .expect("delete");
        assert_eq!(removed, 1);
    }
}
