//! Kaderisasi - Membership and Community Backend
//!
//! Accounts with legacy-member migration, activity and club registration with
//! eligibility gating, achievements and leaderboards, certificate data,
//! custom forms, and peer-counseling intake, served over a JSON HTTP API.

pub mod achievements;
pub mod activities;
pub mod api;
pub mod certificates;
pub mod clubs;
pub mod counseling;
pub mod forms;
pub mod identity;
pub mod registration;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use api::{router, AppState};
pub use registration::{Document, RegistrationError};
pub use storage::config::AppConfig;
pub use storage::Database;
