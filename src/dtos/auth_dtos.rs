use serde::Serialize;

use crate::models::user::UserProfile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserProfile,
    /// True when this sign-in created the profile.
    pub created: bool,
}
