use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::models::cricket_match::MatchStatus;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_distinct_teams"))]
pub struct CreateMatchRequest {
    pub id: Option<String>,

    #[validate(length(min = 1, message = "team1Id is required"))]
    pub team1_id: String,

    #[validate(length(min = 1, message = "team2Id is required"))]
    pub team2_id: String,

    #[validate(length(min = 1, max = 200, message = "venue must be 1-200 characters"))]
    pub venue: String,

    pub start_time: DateTime<Utc>,

    #[serde(default)]
    pub status: MatchStatus,

    #[serde(default)]
    pub predictions_enabled_by_admin: Option<bool>,
}

fn validate_distinct_teams(request: &CreateMatchRequest) -> Result<(), ValidationError> {
    if request.team1_id == request.team2_id {
        let mut error = ValidationError::new("distinct_teams");
        error.message = Some("a team cannot play itself".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    #[validate(length(min = 1, message = "team1Id cannot be empty"))]
    pub team1_id: Option<String>,

    #[validate(length(min = 1, message = "team2Id cannot be empty"))]
    pub team2_id: Option<String>,

    #[validate(length(min = 1, max = 200, message = "venue must be 1-200 characters"))]
    pub venue: Option<String>,

    pub start_time: Option<DateTime<Utc>>,

    pub status: Option<MatchStatus>,
}

#[derive(Debug, Deserialize)]
pub struct OverrideRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub status: Option<MatchStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_same_team_twice() {
        let request: CreateMatchRequest = serde_json::from_value(json!({
            "team1Id": "csk",
            "team2Id": "csk",
            "venue": "Chepauk",
            "startTime": "2026-04-10T14:00:00Z",
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn status_defaults_to_upcoming() {
        let request: CreateMatchRequest = serde_json::from_value(json!({
            "team1Id": "csk",
            "team2Id": "mi",
            "venue": "Chepauk",
            "startTime": "2026-04-10T14:00:00Z",
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.status, MatchStatus::Upcoming);
    }
}
