//! Service layer for business logic and orchestration.
//!
//! Services sit between the repository and the HTTP handlers:
//! - [`aggregation`]: folds response rows into per-respondent records
//! - [`report`]: converts records into the report wire format
//! - [`survey_responses`]: composes fetch, aggregation and serialization

pub mod aggregation;
pub mod report;
pub mod survey_responses;

pub use aggregation::{aggregate_responses, ANSWER_SEPARATOR};
pub use report::build_report;
pub use survey_responses::{
    fetch_responses, get_survey_report, DEADLINE_GRACE, DEFAULT_FETCH_DEADLINE,
};
