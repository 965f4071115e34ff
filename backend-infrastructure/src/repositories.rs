pub mod file_store;
pub mod memory_store;
pub mod tables;

pub use file_store::*;
pub use memory_store::*;
pub use tables::*;
