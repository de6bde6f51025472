use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::eligibility::{prediction_window, PredictionWindow};

pub const COLLECTION: &str = "matches";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Upcoming,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }
}

// Main Match model - mirrors the `matches` documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default)]
    pub id: String,
    pub team1_id: String,
    pub team2_id: String,
    pub venue: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    /// Forces predictions open ahead of the default window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions_enabled_by_admin: Option<bool>,
    /// Written by the result-scoring process once the match is decided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn admin_override(&self) -> bool {
        self.predictions_enabled_by_admin.unwrap_or(false)
    }

    /// Only upcoming matches accept predictions; beyond that the timing rules
    /// decide.
    pub fn prediction_window(&self, now: DateTime<Utc>) -> PredictionWindow {
        if self.status != MatchStatus::Upcoming {
            return PredictionWindow::Closed;
        }
        prediction_window(now, self.start_time, self.admin_override())
    }

    pub fn involves(&self, team_id: &str) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

/// Match plus its window state at the time of the request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    #[serde(flatten)]
    pub game: Match,
    pub prediction_window: PredictionWindow,
    pub predictions_open: bool,
}

impl MatchView {
    pub fn at(game: Match, now: DateTime<Utc>) -> Self {
        let window = game.prediction_window(now);
        MatchView {
            predictions_open: window.is_open(),
            prediction_window: window,
            game,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn upcoming(start: DateTime<Utc>) -> Match {
        Match {
            id: "m1".into(),
            team1_id: "csk".into(),
            team2_id: "mi".into(),
            venue: "Chepauk".into(),
            start_time: start,
            status: MatchStatus::Upcoming,
            predictions_enabled_by_admin: None,
            winner_team_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn live_and_completed_matches_are_closed_even_with_override() {
        let now = Utc::now();
        let mut game = upcoming(now + Duration::hours(2));
        game.predictions_enabled_by_admin = Some(true);
        assert!(game.prediction_window(now).is_open());

        game.status = MatchStatus::Live;
        assert_eq!(game.prediction_window(now), PredictionWindow::Closed);
        game.status = MatchStatus::Completed;
        assert_eq!(game.prediction_window(now), PredictionWindow::Closed);
    }

    #[test]
    fn missing_override_reads_as_false() {
        let game: Match = serde_json::from_value(serde_json::json!({
            "id": "m9",
            "team1Id": "rcb",
            "team2Id": "kkr",
            "venue": "Chinnaswamy",
            "startTime": "2026-05-01T14:00:00Z",
        }))
        .unwrap();
        assert!(!game.admin_override());
        assert_eq!(game.status, MatchStatus::Upcoming);
        assert!(game.involves("kkr"));
        assert!(!game.involves("srh"));
    }

    #[test]
    fn view_reports_window() {
        let now = Utc::now();
        let view = MatchView::at(upcoming(now + Duration::hours(30)), now);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["predictionsOpen"], false);
        assert_eq!(json["predictionWindow"], "notYetOpen");
        assert_eq!(json["team1Id"], "csk");
    }
}
