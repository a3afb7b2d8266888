//! Activities module
//!
//! Provides the published activity catalog, registration with a level gate,
//! and the status-visibility window.

pub mod catalog;
pub mod registration;
pub mod store;
pub mod types;
pub mod visibility;

pub use catalog::ActivityCatalog;
pub use registration::ActivityRegistrar;
pub use store::{ActivityFilter, ActivityStore};
pub use types::*;
