//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;
use crate::routes::session::GET_ADMIN_AUTHENTICATED;
use crate::routes::survey_responses::{
    GET_ADMIN_RESPONSES, GET_SURVEY_RESPONSES, GET_SURVEY_RESPONSES_BY_PATH,
};

/// Create the main application router with all routes and middleware.
///
/// Read routes answer GET (and HEAD, which axum derives from GET); any
/// other method hits the fallback before auth or data access runs.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            GET_ADMIN_AUTHENTICATED,
            get(handlers::get_session_status).fallback(handlers::method_not_allowed),
        )
        .route(
            GET_SURVEY_RESPONSES,
            get(handlers::get_survey_responses).fallback(handlers::method_not_allowed),
        )
        .route(
            GET_ADMIN_RESPONSES,
            get(handlers::get_survey_responses).fallback(handlers::method_not_allowed),
        )
        .route(
            GET_SURVEY_RESPONSES_BY_PATH,
            get(handlers::get_survey_responses_by_path).fallback(handlers::method_not_allowed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
