use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use backend_application::AppState;
use backend_domain::RecordStore;
use backend_infrastructure::{
    AppConfig, JsonFileRecordStore, MemoryRecordStore, StoreBackend, SystemClock,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config()?;

        let store: Arc<dyn RecordStore> = match config.store_backend {
            StoreBackend::Memory => {
                info!("using in-memory record store; data is lost on exit");
                Arc::new(MemoryRecordStore::new())
            }
            StoreBackend::File => Arc::new(JsonFileRecordStore::open(&config.store_path).await?),
        };

        let state = AppState::new(runtime_config, store, Arc::new(SystemClock))?;
        info!(
            week_start = %state.calendar.week_start(),
            utc_offset_minutes = state.config.calendar.utc_offset_minutes,
            qr_enabled = state.config.qr_secret.is_some(),
            "application state ready"
        );
        Ok(Self { state })
    }
}
