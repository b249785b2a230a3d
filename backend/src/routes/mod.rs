pub mod session;
pub mod survey_responses;
