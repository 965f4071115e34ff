// Port traits (interfaces)
// Define what the domain needs from infrastructure

pub mod record_store;
pub mod services;

pub use record_store::*;
pub use services::*;
