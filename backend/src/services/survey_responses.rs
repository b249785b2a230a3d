//! Survey report service: fetch, aggregate, serialize.
//!
//! The fetch is awaited in full before aggregation starts, and the two pure
//! steps never fail, so a report is either complete or an error.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::aggregation::aggregate_responses;
use super::report::build_report;
use crate::api::{RespondentReport, ResponseRow, SurveyId};
use crate::db::repository::{RepositoryError, RepositoryResult, ResponseRepository};

/// Upper bound on a single fetch when nothing else is configured.
pub const DEFAULT_FETCH_DEADLINE: Duration = Duration::from_secs(10);

/// Extra time granted past the deadline before the caller stops waiting on a
/// backend that did not enforce it.
pub const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Fetch the rows of a survey within `deadline`.
///
/// The deadline is handed to the repository, which releases its connection
/// before reporting a timeout. The outer timer only fires for a backend that
/// overruns by more than [`DEADLINE_GRACE`].
pub async fn fetch_responses(
    repo: &dyn ResponseRepository,
    survey_id: &SurveyId,
    deadline: Duration,
) -> RepositoryResult<Vec<ResponseRow>> {
    let backstop = deadline.saturating_add(DEADLINE_GRACE);
    match tokio::time::timeout(backstop, repo.fetch_survey_responses(survey_id, deadline)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(survey_id = %survey_id, "Repository overran its fetch deadline");
            Err(RepositoryError::deadline_exceeded(survey_id, deadline))
        }
    }
}

/// Build the aggregated report for a survey.
pub async fn get_survey_report(
    repo: &dyn ResponseRepository,
    survey_id: &SurveyId,
    deadline: Duration,
) -> RepositoryResult<Vec<RespondentReport>> {
    let rows = fetch_responses(repo, survey_id, deadline).await?;
    let row_count = rows.len();
    debug!(survey_id = %survey_id, rows = row_count, "Fetched survey responses");

    let records = aggregate_responses(rows);
    info!(
        survey_id = %survey_id,
        rows = row_count,
        respondents = records.len(),
        "Built survey report"
    );

    Ok(build_report(records))
}
