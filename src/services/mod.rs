pub mod client_config;
pub mod eligibility;
pub mod google_auth;
pub mod identity;
pub mod leaderboard;
pub mod secret_vault;
pub mod subscription;
