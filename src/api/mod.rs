//! HTTP API module
//!
//! Provides:
//! - The `/v2` router over every feature service
//! - Bearer-token authentication and JSON/multipart extractors
//! - Domain error to HTTP status mapping
//! - Request logging and CORS

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::storage::config::ServerSettings;
use handlers::{achievements, activities, clubs, community, identity};

pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn router(state: AppState, settings: &ServerSettings) -> Router {
    let v2 = Router::new()
        // Auth
        .route("/auth/register", post(identity::register))
        .route("/auth/login", post(identity::login))
        .route("/auth/forgot-password", post(identity::forgot_password))
        .route("/auth/reset-password", put(identity::reset_password))
        .route("/auth/logout", put(identity::logout))
        // Profile
        .route("/profiles", get(identity::show_profile).put(identity::update_profile))
        .route("/profiles/picture", post(identity::upload_picture))
        .route("/profiles/activities", get(identity::my_activities))
        .route("/profiles/activities/:slug", get(activities::check_status))
        // Activities
        .route("/activities", get(activities::list))
        .route("/activities/categories", get(activities::categories))
        .route("/activities/:slug", get(activities::show))
        .route("/activities/:slug/register", post(activities::register))
        .route(
            "/activities/:slug/registration",
            get(activities::registration_data).put(activities::edit_answers),
        )
        // Clubs
        .route("/clubs", get(clubs::list))
        .route("/clubs/registrations/mine", get(clubs::mine))
        .route("/clubs/:id", get(clubs::show))
        .route(
            "/clubs/:id/registration",
            post(clubs::register)
                .get(clubs::check)
                .put(clubs::update)
                .delete(clubs::cancel),
        )
        // Achievements and leaderboards
        .route("/achievements", post(achievements::submit))
        .route("/achievements/mine", get(achievements::mine))
        .route("/achievements/:id", put(achievements::update))
        .route("/leaderboards/monthly", get(achievements::monthly))
        .route("/leaderboards/lifetime", get(achievements::lifetime))
        // Certificates
        .route("/certificates/:id", get(community::certificate))
        .route("/certificates/:id/download", get(community::download_certificate))
        // Custom forms
        .route("/custom-forms", get(community::form_by_feature))
        .route("/custom-forms/register", post(community::submit_form))
        // Counseling
        .route(
            "/ruang-curhat",
            post(community::submit_counseling).get(community::counseling_history),
        );

    Router::new()
        .nest("/v2", v2)
        .layer(DefaultBodyLimit::max(settings.body_limit_bytes))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(cors(&settings.cors_origins))
        .with_state(state)
}

fn cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}
