use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use backend_domain::{
    build_award_policy, AwardPolicy, Clock, RecordStore, RuntimeConfig, WeekCalendar,
};

use crate::records::Records;
use crate::timed_store::TimedRecordStore;
use crate::{AppError, Metrics};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub store: Arc<dyn RecordStore>,
    pub clock: Arc<dyn Clock>,
    pub award_policy: Arc<dyn AwardPolicy>,
    pub calendar: WeekCalendar,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wraps `store` so that every call is bounded by `store_timeout_ms`.
    pub fn new(
        config: RuntimeConfig,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let calendar = WeekCalendar::new(config.calendar).ok_or_else(|| {
            anyhow!(
                "utc offset {} minutes is out of range",
                config.calendar.utc_offset_minutes
            )
        })?;
        let timed = TimedRecordStore::new(store, Duration::from_millis(config.store_timeout_ms));
        let award_policy: Arc<dyn AwardPolicy> =
            Arc::from(build_award_policy(&config.award_policy));
        Ok(Self {
            config,
            store: Arc::new(timed),
            clock,
            award_policy,
            calendar,
            metrics: Arc::new(Metrics::default()),
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn records(&self) -> Records<'_> {
        Records::new(self.store.as_ref())
    }

    /// Logs a finished operation at the level its outcome deserves and
    /// hands the result back untouched.
    pub fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, AppError>,
    ) -> Result<T, AppError> {
        if let Err(err) = &result {
            match err {
                AppError::Conflict(_) => {
                    self.metrics.record_conflict();
                    debug!(operation, kind = err.kind(), "operation rejected: {}", err);
                }
                AppError::BackendUnavailable(_) => {
                    self.metrics.record_backend_failure();
                    warn!(operation, "record store unavailable: {}", err);
                }
                AppError::Internal(_) => {
                    error!(operation, "operation failed: {:#}", err);
                }
                _ => debug!(operation, kind = err.kind(), "operation rejected: {}", err),
            }
        }
        result
    }
}
