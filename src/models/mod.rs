pub mod client_config;
pub mod cricket_match;
pub mod leaderboard;
pub mod prediction;
pub mod question;
pub mod team;
pub mod user;
