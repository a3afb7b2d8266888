//! Achievements module
//!
//! Provides achievement submission with proof uploads, pre-review editing,
//! and the monthly and lifetime leaderboards.

pub mod leaderboard;
pub mod manager;
pub mod store;
pub mod types;

pub use leaderboard::LeaderboardService;
pub use manager::{AchievementError, AchievementManager};
pub use store::AchievementStore;
pub use types::*;
