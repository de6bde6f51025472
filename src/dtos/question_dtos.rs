use std::collections::HashSet;

use serde::Deserialize;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_new_question"))]
pub struct CreateQuestionRequest {
    pub id: Option<String>,

    #[validate(length(min = 1, message = "matchId is required"))]
    pub match_id: String,

    #[validate(length(min = 1, max = 500, message = "text must be 1-500 characters"))]
    pub text: String,

    #[validate(length(min = 2, max = 10, message = "between 2 and 10 options are required"))]
    pub options: Vec<String>,

    #[validate(range(min = 0, max = 100))]
    pub points: Option<i64>,

    pub correct_option: Option<String>,
}

impl CreateQuestionRequest {
    /// Trims options and the correct option so they compare the same way
    /// submitted answers do.
    pub fn normalize(&mut self) {
        trim_options(&mut self.options, &mut self.correct_option);
    }
}

fn validate_new_question(request: &CreateQuestionRequest) -> Result<(), ValidationError> {
    check_options(&request.options, request.correct_option.as_deref())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 500, message = "text must be 1-500 characters"))]
    pub text: Option<String>,

    #[validate(length(min = 2, max = 10, message = "between 2 and 10 options are required"))]
    pub options: Option<Vec<String>>,

    #[validate(range(min = 0, max = 100))]
    pub points: Option<i64>,

    pub correct_option: Option<String>,
}

impl UpdateQuestionRequest {
    pub fn normalize(&mut self) {
        trim_options(self.options.as_deref_mut().unwrap_or_default(), &mut self.correct_option);
    }
}

fn trim_options(options: &mut [String], correct: &mut Option<String>) {
    for option in options.iter_mut() {
        *option = option.trim().to_string();
    }
    if let Some(correct) = correct.as_mut() {
        *correct = correct.trim().to_string();
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionQuery {
    pub match_id: Option<String>,
}

/// Options must be distinct and non-blank, and the correct option (if any)
/// must be one of them.
pub fn check_options(options: &[String], correct: Option<&str>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for option in options {
        if option.trim().is_empty() || !seen.insert(option.as_str()) {
            let mut error = ValidationError::new("options");
            error.message = Some("options must be distinct and non-blank".into());
            return Err(error);
        }
    }
    if let Some(correct) = correct {
        if !seen.contains(correct) {
            let mut error = ValidationError::new("correct_option");
            error.message = Some("correctOption must be one of the options".into());
            return Err(error);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn option_rules() {
        assert!(check_options(&options(&["CSK", "MI"]), Some("MI")).is_ok());
        assert!(check_options(&options(&["CSK", "MI"]), Some("RCB")).is_err());
        assert!(check_options(&options(&["CSK", "CSK"]), None).is_err());
        assert!(check_options(&options(&["CSK", " "]), None).is_err());
    }

    #[test]
    fn padded_options_are_trimmed_before_checks() {
        let mut request: CreateQuestionRequest = serde_json::from_value(serde_json::json!({
            "matchId": "m1",
            "text": "Toss winner?",
            "options": [" MI", "CSK "],
            "correctOption": "MI ",
        }))
        .unwrap();
        request.normalize();
        assert_eq!(request.options, options(&["MI", "CSK"]));
        assert_eq!(request.correct_option.as_deref(), Some("MI"));
        assert!(request.validate().is_ok());

        let mut duplicate: CreateQuestionRequest = serde_json::from_value(serde_json::json!({
            "matchId": "m1",
            "text": "Toss winner?",
            "options": [" MI", "MI"],
        }))
        .unwrap();
        duplicate.normalize();
        assert!(duplicate.validate().is_err());

        let mut update: UpdateQuestionRequest =
            serde_json::from_value(serde_json::json!({ "correctOption": " CSK" })).unwrap();
        update.normalize();
        assert!(update.options.is_none());
        assert_eq!(update.correct_option.as_deref(), Some("CSK"));
    }
}
