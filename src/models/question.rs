use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "questions";

fn default_points() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default)]
    pub id: String,
    pub match_id: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(default = "default_points")]
    pub points: i64,
    /// Only admins see this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn has_option(&self, answer: &str) -> bool {
        self.options.iter().any(|option| option == answer)
    }

    /// The question as shown to players.
    pub fn public(mut self) -> Self {
        self.correct_option = None;
        self
    }
}
