use serde::{Deserialize, Serialize};

/// Firebase web client configuration served to the browser app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseClientConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_id: Option<String>,
}

impl FirebaseClientConfig {
    /// Required keys, as they appear in JSON.
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "apiKey",
        "authDomain",
        "projectId",
        "storageBucket",
        "messagingSenderId",
        "appId",
    ];

    /// Development-only configuration pointing at a demo project. Served only
    /// when every other source failed and the fallback is allowed.
    pub fn development() -> Self {
        FirebaseClientConfig {
            api_key: "demo-api-key".to_string(),
            auth_domain: "demo-cricket-predictor.firebaseapp.com".to_string(),
            project_id: "demo-cricket-predictor".to_string(),
            storage_bucket: "demo-cricket-predictor.appspot.com".to_string(),
            messaging_sender_id: "000000000000".to_string(),
            app_id: "1:000000000000:web:0000000000000000".to_string(),
            measurement_id: None,
        }
    }
}
