//! Auth and profile endpoints.

use axum::extract::{Multipart, Query, State};
use serde::Deserialize;

use super::{blocking, created, done, ok, ApiResult, ListQuery};
use crate::api::error::ApiError;
use crate::api::extract::{AuthUser, JsonBody, MultipartForm};
use crate::api::state::AppState;
use crate::identity::{ProfileError, ProfileUpdate};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterBody {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailBody {
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordBody {
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

// ========== Auth ==========

pub async fn register(State(state): State<AppState>, JsonBody(body): JsonBody<RegisterBody>) -> ApiResult {
    let account = blocking(&state.auth, move |auth| {
        auth.register(&body.fullname, &body.email, &body.password)
    })
    .await?;
    created("REGISTER_SUCCESS", account)
}

pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody<LoginBody>) -> ApiResult {
    let outcome = blocking(&state.auth, move |auth| {
        auth.login_or_migrate(&body.email, &body.password)
    })
    .await?;
    ok("LOGIN_SUCCESS", outcome)
}

pub async fn forgot_password(State(state): State<AppState>, JsonBody(body): JsonBody<EmailBody>) -> ApiResult {
    blocking(&state.auth, move |auth| auth.request_password_reset(&body.email)).await?;
    done("SEND_EMAIL_SUCCESS")
}

pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    JsonBody(body): JsonBody<PasswordBody>,
) -> ApiResult {
    let token = query.token.unwrap_or_default();
    blocking(&state.auth, move |auth| auth.reset_password(&token, &body.password)).await?;
    done("RESET_PASSWORD_SUCCESS")
}

pub async fn logout(State(state): State<AppState>, AuthUser(claims): AuthUser) -> ApiResult {
    state.auth.logout(&claims);
    done("LOGOUT_SUCCESS")
}

// ========== Profile ==========

pub async fn show_profile(State(state): State<AppState>, AuthUser(claims): AuthUser) -> ApiResult {
    let details = blocking(&state.profiles, move |profiles| profiles.show(&claims.sub)).await?;
    ok("GET_DATA_SUCCESS", details)
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult {
    let profile = blocking(&state.profiles, move |profiles| profiles.update(&claims.sub, update)).await?;
    ok("UPDATE_DATA_SUCCESS", profile)
}

pub async fn upload_picture(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> ApiResult {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or(ApiError::BadRequest("PICTURE_REQUIRED"))?;

    let profile = blocking(&state.profiles, move |profiles| {
        profiles.upload_picture(&claims.sub, file).map_err(|e| match e {
            ProfileError::Validation(errors) => ApiError::Invalid {
                code: "INVALID_PICTURE",
                errors,
            },
            other => other.into(),
        })
    })
    .await?;
    ok("UPLOAD_SUCCESS", profile)
}

pub async fn my_activities(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let page = blocking(&state.registrar, move |registrar| {
        registrar.list_for_user(&claims.sub, query.page_request())
    })
    .await?;
    ok("GET_DATA_SUCCESS", page)
}
