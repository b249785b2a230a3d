//! Public API surface for the survey reporting backend.
//!
//! This file consolidates the domain types shared by the repository, service
//! and HTTP layers. Wire types live in [`crate::routes`] and are re-exported here.

pub use crate::routes::survey_responses::QuestionResponse;
pub use crate::routes::survey_responses::RespondentIdentity;
pub use crate::routes::survey_responses::RespondentReport;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Survey identifier as supplied by the caller.
///
/// The value is opaque: it is only checked for presence and is always bound
/// as a query parameter, never interpolated into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurveyId(pub String);

impl SurveyId {
    pub fn new(value: impl Into<String>) -> Self {
        SurveyId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }

    /// Parse a raw query value, treating blank input as missing.
    ///
    /// A non-blank value is kept verbatim; ids are opaque.
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.filter(|v| !v.trim().is_empty()).map(SurveyId::new)
    }
}

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SurveyId {
    fn from(value: &str) -> Self {
        SurveyId::new(value)
    }
}

impl From<String> for SurveyId {
    fn from(value: String) -> Self {
        SurveyId(value)
    }
}

/// One joined (respondent, question, answer) tuple read from the data source.
///
/// Nullable columns stay `Option` so a missing value never fails the fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseRow {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub question_text: String,
    pub answer_text: Option<String>,
}

impl ResponseRow {
    /// Identity fields of the respondent who produced this row.
    pub fn identity(&self) -> RespondentIdentity {
        RespondentIdentity {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            city: self.city.clone(),
            organization: self.organization.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Grouping key for respondents: first and last name joined with `-`.
///
/// Two different people sharing a full name map to the same key and have
/// their answers merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RespondentKey(String);

impl RespondentKey {
    pub const SEPARATOR: &'static str = "-";

    pub fn for_row(row: &ResponseRow) -> Self {
        let first = row.first_name.as_deref().unwrap_or_default();
        let last = row.last_name.as_deref().unwrap_or_default();
        RespondentKey(format!("{first}{}{last}", Self::SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A respondent with their answers merged per question.
///
/// `answers` keeps questions in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondentRecord {
    pub identity: RespondentIdentity,
    pub answers: IndexMap<String, String>,
}

impl RespondentRecord {
    pub fn new(identity: RespondentIdentity) -> Self {
        Self {
            identity,
            answers: IndexMap::new(),
        }
    }

    pub fn question_count(&self) -> usize {
        self.answers.len()
    }
}
