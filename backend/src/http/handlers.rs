//! HTTP handlers for the REST API.
//!
//! The report handlers run the same sequence: method check (done by the
//! router fallback), credential check, survey id check, then the report
//! service. A failing step ends the request; later steps never run.

use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::{header::COOKIE, HeaderMap},
    Json,
};
use chrono::Utc;
use tracing::{debug, warn};

use super::dto::{HealthResponse, RespondentReport, SessionStatus, SurveyResponsesQuery};
use super::error::AppError;
use super::state::AppState;
use crate::api::SurveyId;
use crate::services::get_survey_report;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the data
/// source is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            "error".to_string()
        }
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        checked_at: Utc::now(),
    }))
}

// =============================================================================
// Session
// =============================================================================

/// GET /api/admin/authenticated
///
/// Reports whether the request carries a valid session cookie. Never fails:
/// a missing or bad token is `{"authenticated": false}`.
pub async fn get_session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionStatus> {
    Json(SessionStatus {
        authenticated: authorize(&state, &headers).is_ok(),
    })
}

// =============================================================================
// Survey Responses
// =============================================================================

/// GET /survey-responses?surveyId=..
/// GET /api/admin/get-responses?id=..
///
/// Aggregated report of every answer given to a survey.
pub async fn get_survey_responses(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<SurveyResponsesQuery>, QueryRejection>,
) -> HandlerResult<Vec<RespondentReport>> {
    authorize(&state, &headers)?;

    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let survey_id = SurveyId::parse(query.survey_id.as_deref())
        .ok_or_else(|| AppError::BadRequest("surveyId query parameter is required".to_string()))?;

    survey_report(&state, survey_id).await
}

/// GET /surveys/{survey_id}/responses
///
/// Same report as [`get_survey_responses`] with the survey id in the path.
pub async fn get_survey_responses_by_path(
    State(state): State<AppState>,
    headers: HeaderMap,
    survey_id: Result<Path<String>, PathRejection>,
) -> HandlerResult<Vec<RespondentReport>> {
    authorize(&state, &headers)?;

    let Path(raw) = survey_id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let survey_id = SurveyId::parse(Some(raw.as_str()))
        .ok_or_else(|| AppError::BadRequest("survey id path segment is empty".to_string()))?;

    survey_report(&state, survey_id).await
}

/// Fallback for every non-GET method on the read routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn survey_report(
    state: &AppState,
    survey_id: SurveyId,
) -> HandlerResult<Vec<RespondentReport>> {
    debug!(survey_id = %survey_id, "Building survey report");
    let report =
        get_survey_report(state.repository.as_ref(), &survey_id, state.fetch_deadline).await?;
    Ok(Json(report))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let cookies = cookie_header(headers);
    if state.verifier.verify(cookies.as_deref()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// All `Cookie` headers of the request joined into one header value.
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join("; "))
    }
}
