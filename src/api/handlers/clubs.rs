//! Club catalog and membership application endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{blocking, done, ok, ApiResult, ListQuery};
use crate::api::extract::{AuthUser, JsonBody};
use crate::api::state::AppState;
use crate::registration::Document;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationBody {
    pub additional_data: Option<Document>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult {
    let clubs = blocking(&state.clubs, move |clubs| clubs.list(query.search(), query.page_request())).await?;
    ok("GET_DATA_SUCCESS", clubs)
}

pub async fn show(State(state): State<AppState>, Path(club_id): Path<i64>) -> ApiResult {
    let club = blocking(&state.clubs, move |clubs| clubs.show(club_id)).await?;
    ok("GET_DATA_SUCCESS", club)
}

pub async fn register(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(club_id): Path<i64>,
    JsonBody(body): JsonBody<ApplicationBody>,
) -> ApiResult {
    let details = blocking(&state.clubs, move |clubs| {
        clubs.register(&claims.sub, club_id, body.additional_data.unwrap_or_default())
    })
    .await?;
    ok("CLUB_REGISTRATION_SUCCESS", details)
}

pub async fn check(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(club_id): Path<i64>,
) -> ApiResult {
    let check = blocking(&state.clubs, move |clubs| clubs.check(&claims.sub, club_id)).await?;
    ok("REGISTRATION_STATUS_RETRIEVED", check)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(club_id): Path<i64>,
    JsonBody(body): JsonBody<ApplicationBody>,
) -> ApiResult {
    let details = blocking(&state.clubs, move |clubs| {
        clubs.update(&claims.sub, club_id, body.additional_data)
    })
    .await?;
    ok("CLUB_REGISTRATION_UPDATED", details)
}

pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(club_id): Path<i64>,
) -> ApiResult {
    blocking(&state.clubs, move |clubs| clubs.cancel(&claims.sub, club_id)).await?;
    done("CLUB_REGISTRATION_DELETED")
}

pub async fn mine(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let page = blocking(&state.clubs, move |clubs| {
        clubs.mine(&claims.sub, query.status(), query.page_request())
    })
    .await?;
    ok("MY_CLUB_REGISTRATIONS_RETRIEVED", page)
}
