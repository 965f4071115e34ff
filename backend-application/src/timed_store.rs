use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use backend_domain::{Collection, Filter, RecordStore, Row, StoreError};

/// Bounds every call to the wrapped store. A call that overruns is reported
/// as [`StoreError::Timeout`] and never retried here.
pub struct TimedRecordStore {
    inner: Arc<dyn RecordStore>,
    limit: Duration,
}

impl TimedRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        timeout(self.limit, call)
            .await
            .map_err(|_| StoreError::Timeout(self.limit))?
    }
}

#[async_trait]
impl RecordStore for TimedRecordStore {
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        self.bounded(self.inner.insert(collection, row)).await
    }

    async fn select_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Row>, StoreError> {
        self.bounded(self.inner.select_one(collection, filter)).await
    }

    async fn select_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        self.bounded(self.inner.select_many(collection, filter, limit))
            .await
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Row,
    ) -> Result<Option<Row>, StoreError> {
        self.bounded(self.inner.update(collection, filter, patch)).await
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, StoreError> {
        self.bounded(self.inner.delete(collection, filter)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.inner.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledStore;

    #[async_trait]
    impl RecordStore for StalledStore {
        async fn insert(&self, _: Collection, row: Row) -> Result<Row, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(row)
        }

        async fn select_one(&self, _: Collection, _: &Filter) -> Result<Option<Row>, StoreError> {
            Ok(None)
        }

        async fn select_many(
            &self,
            _: Collection,
            _: &Filter,
            _: Option<usize>,
        ) -> Result<Vec<Row>, StoreError> {
            Ok(Vec::new())
        }

        async fn update(
            &self,
            _: Collection,
            _: &Filter,
            _: Row,
        ) -> Result<Option<Row>, StoreError> {
            Ok(None)
        }

        async fn delete(&self, _: Collection, _: &Filter) -> Result<usize, StoreError> {
            Ok(0)
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn overrunning_calls_time_out() {
        let store = TimedRecordStore::new(Arc::new(StalledStore), Duration::from_millis(20));
        let err = store
            .insert(Collection::Events, Row::new())
            .await
            .expect_err("stalled insert");
        assert!(matches!(err, StoreError::Timeout(limit) if limit == Duration::from_millis(20)));
        assert!(store.ping().await.is_ok());
    }
}
