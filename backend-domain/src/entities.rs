// Domain entities

pub mod attendance;
pub mod config;
pub mod event;
pub mod group;
pub mod ledger;
pub mod stats;

pub use attendance::*;
pub use config::*;
pub use event::*;
pub use group::*;
pub use ledger::*;
pub use stats::*;
