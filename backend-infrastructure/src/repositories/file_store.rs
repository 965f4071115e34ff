use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};

use backend_domain::{Collection, Filter, RecordStore, Row, StoreError};

use super::tables::Tables;

/// Store persisted as a single JSON document. Every write produces the next
/// snapshot, persists it, and only then becomes visible to readers.
pub struct JsonFileRecordStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl JsonFileRecordStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let content = fs::read_to_string(&path).await?;
            let rows: BTreeMap<Collection, Vec<Row>> = serde_json::from_str(&content)?;
            Tables::from_rows(rows)
        } else {
            Tables::default()
        };
        let counts = tables
            .rows()
            .iter()
            .map(|(collection, rows)| format!("{}={}", collection, rows.len()))
            .collect::<Vec<_>>()
            .join(" ");
        info!(path = %path.display(), rows = %counts, "record store opened");
        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    async fn commit<T>(
        &self,
        apply: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut current = self.tables.lock().await;
        let mut next = current.clone();
        let output = apply(&mut next)?;
        if next != *current {
            self.persist(&next).await.map_err(|err| {
                error!(path = %self.path.display(), "failed to persist record store: {}", err);
                StoreError::Unavailable(err.to_string())
            })?;
            *current = next;
        }
        Ok(output)
    }

    async fn persist(&self, tables: &Tables) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string(tables.rows())?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, content).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn insert(&self, collection: Collection, row: Row) -> Result<Row, StoreError> {
        self.commit(|tables| tables.insert(collection, row)).await
    }

    async fn select_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Row>, StoreError> {
        Ok(self.tables.lock().await.select_one(collection, filter))
    }

    async fn select_many(
        &self,
        collection: Collection,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        Ok(self.tables.lock().await.select_many(collection, filter, limit))
    }

    async fn update(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: Row,
    ) -> Result<Option<Row>, StoreError> {
        self.commit(|tables| tables.update(collection, filter, patch)).await
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<usize, StoreError> {
        self.commit(|tables| Ok(tables.delete(collection, filter))).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::metadata(parent)
            .await
            .map(|_| ())
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }
}
