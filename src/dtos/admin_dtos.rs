use serde::Deserialize;

use crate::models::user::Role;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// Destructive leaderboard actions must echo the leaderboard id.
#[derive(Debug, Deserialize)]
pub struct ResetLeaderboardRequest {
    #[serde(default)]
    pub confirm: Option<String>,
}
