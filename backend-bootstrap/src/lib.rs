pub mod context;
pub mod lifecycle;
pub mod logging;

pub use lifecycle::{run_standalone, start_embedded, BackendHandle};
pub use logging::init_logging;
