pub mod attendance_handlers;
pub mod event_handlers;
pub mod group_handlers;
pub mod ops_handlers;
pub mod points_handlers;

pub use attendance_handlers::*;
pub use event_handlers::*;
pub use group_handlers::*;
pub use ops_handlers::*;
pub use points_handlers::*;
