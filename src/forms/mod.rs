//! Custom forms module
//!
//! Serves admin-defined forms by the feature they belong to and routes
//! submissions to activity or club registration.

pub mod dispatch;
pub mod store;
pub mod types;

pub use dispatch::{FormOutcome, FormService};
pub use store::FormStore;
pub use types::{CustomForm, FeatureSubmission, FeatureType, RawSubmission};

use crate::registration::RegistrationError;
use crate::storage::DatabaseError;

/// Custom form errors.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("feature_type and feature_id are required")]
    FeatureTypeAndIdRequired,

    #[error("Invalid feature type: {0}")]
    InvalidFeatureType(String),

    #[error("Custom form not found")]
    NotFound,

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
