// Domain value objects
pub mod cause_category;
pub mod identifiers;
pub mod invite_code;

pub use cause_category::*;
pub use identifiers::*;
pub use invite_code::*;
