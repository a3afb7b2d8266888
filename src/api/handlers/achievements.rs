//! Achievement and leaderboard endpoints.

use axum::extract::{Multipart, Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use super::{blocking, created, ok, ApiResult, ListQuery};
use crate::achievements::leaderboard::parse_month;
use crate::achievements::{AchievementError, AchievementInput, AchievementPatch};
use crate::api::error::ApiError;
use crate::api::extract::{AuthUser, MultipartForm};
use crate::api::state::AppState;
use crate::validation::ValidationErrors;

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
    pub page: Option<u32>,
    #[serde(alias = "limit")]
    pub per_page: Option<u32>,
}

fn achievement_type(form: &MultipartForm) -> Result<Option<i32>, ApiError> {
    form.text("type")
        .map(|raw| {
            raw.trim().parse::<i32>().map_err(|_| {
                ApiError::validation(ValidationErrors::single(
                    "type",
                    "number",
                    "The type field must be a number",
                ))
            })
        })
        .transpose()
}

pub async fn submit(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    multipart: Multipart,
) -> ApiResult {
    let mut form = MultipartForm::read(multipart).await?;
    let input = AchievementInput {
        name: form.text("name").unwrap_or_default().to_string(),
        description: form.text("description").unwrap_or_default().to_string(),
        achievement_date: form.text("achievement_date").unwrap_or_default().to_string(),
        achievement_type: achievement_type(&form)?.unwrap_or_default(),
    };
    let proof = form.take_file("proof").ok_or_else(|| {
        ApiError::from(AchievementError::InvalidFile(ValidationErrors::single(
            "proof",
            "required",
            "The proof field must be defined",
        )))
    })?;

    let achievement = blocking(&state.achievements, move |achievements| {
        achievements.submit(&claims.sub, input, proof)
    })
    .await?;
    created("CREATE_DATA_SUCCESS", achievement)
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound("ACHIEVEMENT_NOT_FOUND"))?;
    let mut form = MultipartForm::read(multipart).await?;
    let patch = AchievementPatch {
        name: form.text("name").map(str::to_string),
        description: form.text("description").map(str::to_string),
        achievement_date: form.text("achievement_date").map(str::to_string),
        achievement_type: achievement_type(&form)?,
    };
    let proof = form.take_file("proof");

    let achievement = blocking(&state.achievements, move |achievements| {
        achievements.update(&claims.sub, &id, patch, proof)
    })
    .await?;
    ok("UPDATE_DATA_SUCCESS", achievement)
}

pub async fn mine(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let page = blocking(&state.achievements, move |achievements| {
        achievements.mine(&claims.sub, query.page_request())
    })
    .await?;
    ok("GET_DATA_SUCCESS", page)
}

pub async fn monthly(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> ApiResult {
    let month = match query.month.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(raw) => Some(parse_month(raw).ok_or_else(|| {
            ApiError::validation(ValidationErrors::single(
                "month",
                "date",
                "The month field must be a valid month",
            ))
        })?),
        None => None,
    };
    let page = ListQuery {
        page: query.page,
        per_page: query.per_page,
        ..Default::default()
    }
    .page_request();

    let ranking = blocking(&state.leaderboards, move |leaderboards| leaderboards.monthly(month, page)).await?;
    ok("GET_DATA_SUCCESS", ranking)
}

pub async fn lifetime(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult {
    let page = query.page_request();
    let ranking = blocking(&state.leaderboards, move |leaderboards| leaderboards.lifetime(page)).await?;
    ok("GET_DATA_SUCCESS", ranking)
}
