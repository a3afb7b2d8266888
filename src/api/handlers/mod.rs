//! HTTP handlers, grouped by feature.
//!
//! Services are synchronous (SQLite behind a mutex, Argon2 hashing, file
//! writes), so every service call runs on the blocking pool via [`blocking`].

pub mod achievements;
pub mod activities;
pub mod clubs;
pub mod community;
pub mod identity;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::storage::PageRequest;

pub type ApiResult = Result<Response, ApiError>;

/// Run a synchronous call against `service` on the blocking pool.
pub async fn blocking<S, T, E, F>(service: &Arc<S>, call: F) -> Result<T, ApiError>
where
    S: ?Sized + Send + Sync + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
    F: FnOnce(&S) -> Result<T, E> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
        .map_err(Into::into)
}

/// Success envelope: `{"message": CODE, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn ok<T: Serialize>(message: &'static str, data: T) -> ApiResult {
    Ok((StatusCode::OK, Json(Envelope { message, data: Some(data) })).into_response())
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> ApiResult {
    Ok((StatusCode::CREATED, Json(Envelope { message, data: Some(data) })).into_response())
}

/// Message-only success.
pub fn done(message: &'static str) -> ApiResult {
    Ok((
        StatusCode::OK,
        Json(Envelope::<()> {
            message,
            data: None,
        }),
    )
        .into_response())
}

/// Query parameters shared by list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub category: Option<i32>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }

    /// Search term, ignoring blanks.
    pub fn search(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    pub fn status(&self) -> Option<&str> {
        non_blank(self.status.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl Counter {
        fn double(&self, n: i32) -> Result<i32, ApiError> {
            if n < 0 {
                return Err(ApiError::BadRequest("NEGATIVE"));
            }
            Ok(n * 2)
        }
    }

    #[tokio::test]
    async fn test_blocking_returns_service_result() {
        let service = Arc::new(Counter);

        assert_eq!(blocking(&service, |c| c.double(21)).await.unwrap(), 42);

        let err = blocking(&service, |c| c.double(-1)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal() {
        let service = Arc::new(Counter);

        let err = blocking(&service, |_| -> Result<i32, ApiError> { panic!("boom") })
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
