use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub id: Option<String>,

    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 10, message = "shortName must be 1-10 characters"))]
    pub short_name: String,

    #[validate(length(max = 2048))]
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 10, message = "shortName must be 1-10 characters"))]
    pub short_name: Option<String>,

    #[validate(length(max = 2048))]
    pub logo_url: Option<String>,
}
