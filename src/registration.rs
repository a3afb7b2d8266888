//! Types shared by activity and club registration.

use crate::storage::DatabaseError;
use crate::validation::ValidationErrors;

/// Free-form answer payload, stored verbatim.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Registration workflow errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Activity not found")]
    ActivityNotFound,

    #[error("Club not found")]
    ClubNotFound,

    #[error("Profile not found")]
    ProfileMissing,

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("Level {actual} is below the required level {required}")]
    LevelTooLow { required: i32, actual: i32 },

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Registration with status {0} cannot be cancelled")]
    CannotCancel(String),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl RegistrationError {
    /// Map an insert failure, treating a uniqueness violation as a duplicate.
    pub fn from_insert(e: DatabaseError) -> Self {
        match e {
            DatabaseError::UniqueViolation(_) => RegistrationError::AlreadyRegistered,
            other => RegistrationError::Database(other),
        }
    }
}
