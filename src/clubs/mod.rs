//! Clubs module
//!
//! Provides club browsing and member applications (apply, check, list,
//! update, withdraw).

pub mod manager;
pub mod store;
pub mod types;

pub use manager::ClubManager;
pub use store::ClubStore;
pub use types::*;
