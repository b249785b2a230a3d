//! Data Transfer Objects for the HTTP API.
//!
//! Report entries and the session status are re-exported from the routes module since they already
//! derive Serialize/Deserialize.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::api::{QuestionResponse, RespondentIdentity, RespondentReport};
pub use crate::routes::session::SessionStatus;

/// Query parameters for the survey responses endpoint.
///
/// `id` is accepted as an alias of `surveyId` for the admin console path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyResponsesQuery {
    #[serde(rename = "surveyId", alias = "id", default)]
    pub survey_id: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
    /// Data source status
    pub database: String,
    /// When the check ran
    pub checked_at: DateTime<Utc>,
}
