use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};

use crate::api::ResponseRow;

/// Result row of the survey responses query.
///
/// Column names match the aliases in `SURVEY_RESPONSES_QUERY`.
#[derive(Debug, Clone, QueryableByName)]
pub struct SurveyResponseRow {
    #[diesel(sql_type = Nullable<Text>)]
    pub first_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub last_name: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub email: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub city: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub organization: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub phone: Option<String>,
    #[diesel(sql_type = Text)]
    pub question_text: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub answer_text: Option<String>,
}

impl From<SurveyResponseRow> for ResponseRow {
    fn from(row: SurveyResponseRow) -> Self {
        ResponseRow {
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            city: row.city,
            organization: row.organization,
            phone: row.phone,
            question_text: row.question_text,
            answer_text: row.answer_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_keeps_nulls() {
        let row = SurveyResponseRow {
            first_name: Some("Ada".to_string()),
            last_name: None,
            email: None,
            city: Some("London".to_string()),
            organization: Some("Central".to_string()),
            phone: None,
            question_text: "Q1".to_string(),
            answer_text: None,
        };

        let converted = ResponseRow::from(row);
        assert_eq!(converted.first_name.as_deref(), Some("Ada"));
        assert_eq!(converted.last_name, None);
        assert_eq!(converted.organization.as_deref(), Some("Central"));
        assert_eq!(converted.answer_text, None);
    }
}
