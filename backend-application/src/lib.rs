// Backend Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod qr;
pub mod queries;
pub mod records;
pub mod state;
pub mod timed_store;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{AppError, ConflictKind, NotFoundKind};
pub use metrics::Metrics;
pub use state::AppState;
