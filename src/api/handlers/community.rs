//! Certificates, custom forms, and counseling endpoints.

use axum::extract::{Path, Query, State};
use serde::Deserialize;

use super::{blocking, created, ok, ApiResult};
use crate::api::extract::{AuthUser, JsonBody};
use crate::api::state::AppState;
use crate::counseling::CounselingInput;
use crate::forms::{FeatureSubmission, RawSubmission};

#[derive(Debug, Default, Deserialize)]
pub struct FeatureQuery {
    pub feature_type: Option<String>,
    pub feature_id: Option<i64>,
}

// ========== Certificates ==========

pub async fn certificate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let bundle = blocking(&state.certificates, move |certificates| certificates.build(&id)).await?;
    ok("CERTIFICATE_DATA_GENERATED", bundle)
}

pub async fn download_certificate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> ApiResult {
    let bundle = blocking(&state.certificates, move |certificates| {
        certificates.build_owned(&claims.sub, &id)
    })
    .await?;
    ok("CERTIFICATE_DATA_GENERATED", bundle)
}

// ========== Custom Forms ==========

pub async fn form_by_feature(State(state): State<AppState>, Query(query): Query<FeatureQuery>) -> ApiResult {
    let form = blocking(&state.forms, move |forms| {
        forms.get_by_feature(query.feature_type.as_deref(), query.feature_id)
    })
    .await?;
    ok("GET_DATA_SUCCESS", form)
}

pub async fn submit_form(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(raw): JsonBody<RawSubmission>,
) -> ApiResult {
    let submission = FeatureSubmission::try_from(raw)?;
    let outcome = blocking(&state.forms, move |forms| forms.submit(&claims.sub, submission)).await?;
    created(outcome.message(), outcome)
}

// ========== Counseling ==========

pub async fn submit_counseling(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    JsonBody(input): JsonBody<CounselingInput>,
) -> ApiResult {
    let request = blocking(&state.counseling, move |counseling| counseling.submit(&claims.sub, input)).await?;
    ok("CREATE_DATA_SUCCESS", request)
}

pub async fn counseling_history(State(state): State<AppState>, AuthUser(claims): AuthUser) -> ApiResult {
    let history = blocking(&state.counseling, move |counseling| counseling.history(&claims.sub)).await?;
    ok("GET_DATA_SUCCESS", history)
}
