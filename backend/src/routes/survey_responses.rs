use serde::{Deserialize, Serialize};

// =========================================================
// Survey responses report types + route
// =========================================================

/// Contact details of a respondent as they appear in the report.
///
/// `organization` is emitted as `pharmacy` to keep the field name the admin
/// console already consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RespondentIdentity {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "pharmacy")]
    pub organization: Option<String>,
    pub phone: Option<String>,
}

/// A single question with every answer the respondent gave to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question: String,
    pub response: String,
}

/// One entry of the aggregated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentReport {
    #[serde(flatten)]
    pub identity: RespondentIdentity,
    pub responses: Vec<QuestionResponse>,
}

pub const GET_SURVEY_RESPONSES: &str = "/survey-responses";
pub const GET_ADMIN_RESPONSES: &str = "/api/admin/get-responses";
pub const GET_SURVEY_RESPONSES_BY_PATH: &str = "/surveys/{survey_id}/responses";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_wire_shape() {
        let report = RespondentReport {
            identity: RespondentIdentity {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                city: Some("London".to_string()),
                organization: Some("Central".to_string()),
                phone: None,
            },
            responses: vec![QuestionResponse {
                question: "Q1".to_string(),
                response: "yes".to_string(),
            }],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            json!({
                "firstName": "Ada",
                "lastName": "Lovelace",
                "email": "ada@example.com",
                "city": "London",
                "pharmacy": "Central",
                "phone": null,
                "responses": [{"question": "Q1", "response": "yes"}]
            })
        );
    }

    #[test]
    fn test_const_values() {
        assert_eq!(GET_SURVEY_RESPONSES, "/survey-responses");
        assert_eq!(GET_ADMIN_RESPONSES, "/api/admin/get-responses");
        assert_eq!(GET_SURVEY_RESPONSES_BY_PATH, "/surveys/{survey_id}/responses");
    }
}
