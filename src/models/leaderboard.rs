use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const COLLECTION: &str = "leaderboards";
pub const ENTRIES: &str = "leaderboardEntries";

pub fn entries_collection(leaderboard_id: &str) -> String {
    format!("{}/{}/{}", COLLECTION, leaderboard_id, ENTRIES)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub entry_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Derived ranking row, stored under the user's id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub points: i64,
    pub correct_predictions: u32,
    pub total_predictions: u32,
    pub rank: u32,
}
