use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPredictionRequest {
    #[validate(length(min = 1, message = "matchId is required"))]
    pub match_id: String,

    #[validate(length(min = 1, message = "questionId cannot be empty"))]
    pub question_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "answer must be 1-200 characters"))]
    pub answer: String,
}
