// Pure domain services

pub mod award_policy;
pub mod calendar;
pub mod leaderboard;
pub mod streaks;

pub use award_policy::*;
pub use calendar::*;
pub use leaderboard::*;
pub use streaks::*;
