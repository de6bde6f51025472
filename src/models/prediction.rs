use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "predictionAnswers";

/// Target id used for "who wins the match" predictions.
pub const WINNER_TARGET: &str = "winner";

/// One answer per user per match target. Resubmitting while the window is open
/// overwrites the previous answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionAnswer {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    pub match_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub answer: String,
    pub submitted_at: DateTime<Utc>,
    /// Set by the result-scoring process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<i64>,
}

impl PredictionAnswer {
    /// `{userId}_{matchId}_{target}`. Match and question ids never contain
    /// `_` and no question may use the id `winner`, so the key stays unique
    /// even for uids with underscores.
    pub fn document_id(user_id: &str, match_id: &str, question_id: Option<&str>) -> String {
        format!(
            "{}_{}_{}",
            user_id,
            match_id,
            question_id.unwrap_or(WINNER_TARGET)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_are_one_per_target() {
        assert_eq!(PredictionAnswer::document_id("u1", "m1", None), "u1_m1_winner");
        assert_eq!(
            PredictionAnswer::document_id("u1", "m1", Some("q7")),
            "u1_m1_q7"
        );
    }
}
