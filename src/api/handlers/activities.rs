//! Activity catalog and registration endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{blocking, ok, ApiResult, ListQuery};
use crate::activities::ActivityFilter;
use crate::api::extract::{AuthUser, JsonBody};
use crate::api::state::AppState;
use crate::registration::Document;

/// Registration body; answers are stored as given.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnswersBody {
    pub questionnaire_answer: Document,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult {
    let filter = ActivityFilter {
        search: query.search().map(str::to_string),
        category: query.category,
    };
    let page = query.page_request();
    let activities = blocking(&state.catalog, move |catalog| catalog.list(&filter, page)).await?;
    ok("GET_DATA_SUCCESS", activities)
}

pub async fn categories(State(state): State<AppState>) -> ApiResult {
    let categories = blocking(&state.catalog, |catalog| catalog.categories()).await?;
    ok("GET_DATA_SUCCESS", categories)
}

pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult {
    let activity = blocking(&state.catalog, move |catalog| catalog.show(&slug)).await?;
    ok("GET_DATA_SUCCESS", activity)
}

pub async fn register(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<AnswersBody>,
) -> ApiResult {
    let registration = blocking(&state.registrar, move |registrar| {
        registrar.register(&claims.sub, &slug, body.questionnaire_answer)
    })
    .await?;
    ok("ACTIVITY_REGISTER_SUCCESS", registration)
}

pub async fn registration_data(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(slug): Path<String>,
) -> ApiResult {
    let registration = blocking(&state.registrar, move |registrar| {
        registrar.registration_data(&claims.sub, &slug)
    })
    .await?;
    ok("GET_DATA_SUCCESS", registration)
}

pub async fn edit_answers(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(slug): Path<String>,
    JsonBody(body): JsonBody<AnswersBody>,
) -> ApiResult {
    let registration = blocking(&state.registrar, move |registrar| {
        registrar.edit_answers(&claims.sub, &slug, body.questionnaire_answer)
    })
    .await?;
    ok("UPDATE_DATA_SUCCESS", registration)
}

/// Status with the visibility window applied.
pub async fn check_status(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(slug): Path<String>,
) -> ApiResult {
    let status = blocking(&state.registrar, move |registrar| {
        registrar.check_status(&claims.sub, &slug)
    })
    .await?;
    ok("GET_DATA_SUCCESS", status)
}
