//! Report serialization: turns aggregated records into the wire format.

use crate::api::{QuestionResponse, RespondentRecord, RespondentReport};

/// Convert aggregated records into report entries.
///
/// Respondent order and per-respondent question order are preserved as-is.
pub fn build_report(records: Vec<RespondentRecord>) -> Vec<RespondentReport> {
    records.into_iter().map(RespondentReport::from).collect()
}

impl From<RespondentRecord> for RespondentReport {
    fn from(record: RespondentRecord) -> Self {
        RespondentReport {
            identity: record.identity,
            responses: record
                .answers
                .into_iter()
                .map(|(question, response)| QuestionResponse { question, response })
                .collect(),
        }
    }
}
