//! Survey response repository trait.
//!
//! This trait is the response fetcher seam: one call, one parameterized query,
//! one scoped connection.

use std::time::Duration;

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{ResponseRow, SurveyId};

/// Repository trait for reading survey responses.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ResponseRepository: Send + Sync {
    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Fetch every answer given to a survey, joined with respondent and
    /// question data.
    ///
    /// Rows are ordered by respondent id, then question id. A connection is
    /// held only for the duration of the call and is released on every exit
    /// path. The call is never retried here.
    ///
    /// The whole call, connection checkout included, is bounded by
    /// `deadline`. When it runs out the implementation gives its connection
    /// back before returning a `TimeoutError`.
    ///
    /// # Arguments
    /// * `survey_id` - The survey whose responses to read
    /// * `deadline` - Time budget for the call
    ///
    /// # Returns
    /// * `Ok(Vec<ResponseRow>)` - Possibly empty
    /// * `Err(RepositoryError)` - Connection, query, timeout or row mapping failure
    async fn fetch_survey_responses(
        &self,
        survey_id: &SurveyId,
        deadline: Duration,
    ) -> RepositoryResult<Vec<ResponseRow>>;
}
