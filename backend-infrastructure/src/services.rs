pub mod clock;
pub mod identity;

pub use clock::*;
pub use identity::*;
