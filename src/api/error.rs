//! Mapping of domain errors onto HTTP responses.
//!
//! Bodies are always `{"message": CODE, "error": [...]?}`. Internal failures
//! are logged here and answered with `GENERAL_ERROR` only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::achievements::AchievementError;
use crate::certificates::CertificateError;
use crate::counseling::CounselingError;
use crate::forms::FormError;
use crate::identity::{AuthError, ProfileError};
use crate::registration::RegistrationError;
use crate::storage::DatabaseError;
use crate::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    /// Bad request carrying the failing fields
    #[error("{code}: {errors}")]
    Invalid {
        code: &'static str,
        errors: ValidationErrors,
    },

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Field validation failure, reported under the first field's message.
    pub fn validation(errors: ValidationErrors) -> Self {
        ApiError::Invalid {
            code: "VALIDATION_ERROR",
            errors,
        }
    }

    fn internal(e: impl std::fmt::Display) -> Self {
        ApiError::Internal(e.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) | ApiError::Invalid { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::NotFound(code)
            | ApiError::Conflict(code)
            | ApiError::Forbidden(code)
            | ApiError::BadRequest(code)
            | ApiError::Unauthorized(code) => json!({ "message": code }),
            ApiError::Invalid { code, errors } => {
                let message: &str = match *code {
                    "VALIDATION_ERROR" => errors.first_message().unwrap_or(*code),
                    other => other,
                };
                json!({ "message": message, "error": errors })
            }
            ApiError::Internal(_) => json!({ "message": "GENERAL_ERROR" }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!("Request failed: {}", detail);
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        ApiError::internal(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(errors) => ApiError::validation(errors),
            AuthError::EmailAlreadyRegistered => ApiError::Conflict("EMAIL_ALREADY_REGISTERED"),
            AuthError::UserNotFound => ApiError::NotFound("USER_NOT_FOUND"),
            AuthError::WrongPassword => ApiError::Unauthorized("WRONG_PASSWORD"),
            AuthError::EmailNotFound => ApiError::NotFound("EMAIL_NOT_FOUND"),
            AuthError::InvalidToken => ApiError::Unauthorized("INVALID_TOKEN"),
            other @ (AuthError::Credential(_)
            | AuthError::Token(_)
            | AuthError::Mail(_)
            | AuthError::Database(_)) => ApiError::internal(other),
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound => ApiError::NotFound("PROFILE_NOT_FOUND"),
            ProfileError::Validation(errors) => ApiError::validation(errors),
            other @ (ProfileError::Storage(_) | ProfileError::Database(_)) => ApiError::internal(other),
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::ActivityNotFound => ApiError::NotFound("ACTIVITY_NOT_FOUND"),
            RegistrationError::ClubNotFound => ApiError::NotFound("CLUB_NOT_FOUND"),
            RegistrationError::ProfileMissing => ApiError::NotFound("PROFILE_NOT_FOUND"),
            RegistrationError::AlreadyRegistered => ApiError::Conflict("ALREADY_REGISTERED"),
            RegistrationError::LevelTooLow { .. } => ApiError::Forbidden("UNMATCHED_LEVEL"),
            RegistrationError::RegistrationNotFound => ApiError::NotFound("REGISTRATION_NOT_FOUND"),
            RegistrationError::CannotCancel(_) => ApiError::BadRequest("CANNOT_CANCEL_REGISTRATION"),
            RegistrationError::Validation(errors) => ApiError::validation(errors),
            RegistrationError::Database(e) => ApiError::internal(e),
        }
    }
}

impl From<AchievementError> for ApiError {
    fn from(e: AchievementError) -> Self {
        match e {
            AchievementError::NotFound => ApiError::NotFound("ACHIEVEMENT_NOT_FOUND"),
            AchievementError::InvalidFile(errors) => ApiError::Invalid {
                code: "INVALID_FILE",
                errors,
            },
            AchievementError::Validation(errors) => ApiError::validation(errors),
            other @ (AchievementError::Storage(_) | AchievementError::Database(_)) => {
                ApiError::internal(other)
            }
        }
    }
}

impl From<CertificateError> for ApiError {
    fn from(e: CertificateError) -> Self {
        match e {
            CertificateError::InvalidRegistrationId => ApiError::BadRequest("INVALID_REGISTRATION_ID"),
            CertificateError::RegistrationNotFound => ApiError::NotFound("REGISTRATION_NOT_FOUND"),
            CertificateError::ActivityNotFound => ApiError::NotFound("ACTIVITY_NOT_FOUND"),
            CertificateError::NoCertificateTemplate => ApiError::BadRequest("NO_CERTIFICATE_TEMPLATE"),
            CertificateError::TemplateNotFound => ApiError::NotFound("CERTIFICATE_TEMPLATE_NOT_FOUND"),
            CertificateError::Forbidden => ApiError::Forbidden("FORBIDDEN"),
            CertificateError::Database(e) => ApiError::internal(e),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::FeatureTypeAndIdRequired => ApiError::BadRequest("FEATURE_TYPE_AND_ID_REQUIRED"),
            FormError::InvalidFeatureType(_) => ApiError::BadRequest("INVALID_FEATURE_TYPE"),
            FormError::NotFound => ApiError::NotFound("CUSTOM_FORM_NOT_FOUND"),
            FormError::Registration(e) => e.into(),
            FormError::Database(e) => ApiError::internal(e),
        }
    }
}

impl From<CounselingError> for ApiError {
    fn from(e: CounselingError) -> Self {
        match e {
            CounselingError::Validation(errors) => ApiError::validation(errors),
            CounselingError::Database(e) => ApiError::internal(e),
        }
    }
}
