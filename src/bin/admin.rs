//! Operator commands that run outside the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cricket_predictor::config::AppConfig;
use cricket_predictor::database::connection::get_store;
use cricket_predictor::models::client_config::FirebaseClientConfig;
use cricket_predictor::services::client_config::parse_secret;
use cricket_predictor::services::google_auth::{
    NoopTokenProvider, ServiceAccountTokenProvider, SharedTokenProvider,
};
use cricket_predictor::services::identity::SharedSecretVerifier;
use cricket_predictor::services::leaderboard::reset_and_mark;
use cricket_predictor::services::secret_vault::{SecretManagerVault, SecretVault};

#[derive(Parser, Debug)]
#[command(name = "predictor-admin", version, about = "Cricket predictor operator tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy the Firebase client config from the secret vault into env lines.
    SyncSecrets {
        /// Secret to read; defaults to FIREBASE_CONFIG_SECRET.
        #[arg(long)]
        secret: Option<String>,
        /// File to write; prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete every entry of a leaderboard.
    ResetLeaderboard {
        leaderboard_id: String,
        /// Required; the reset cannot be undone.
        #[arg(long)]
        yes: bool,
    },
    /// Sign a development ID token with JWT_SECRET.
    DevToken {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Lifetime in hours.
        #[arg(long, default_value_t = 12)]
        hours: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::SyncSecrets { secret, out } => sync_secrets(&config, secret, out).await,
        Command::ResetLeaderboard { leaderboard_id, yes } => {
            if !yes {
                bail!("refusing to reset leaderboard {} without --yes", leaderboard_id);
            }
            let tokens = token_provider(&config).await?;
            let store = get_store(&config, tokens).await?;
            match reset_and_mark(store.as_ref(), &leaderboard_id).await {
                Ok(deleted) => {
                    println!("deleted {} entries from {}", deleted, leaderboard_id);
                    Ok(())
                }
                Err(e) => {
                    eprintln!(
                        "reset stopped after deleting {} entries",
                        e.deleted_before_failure()
                    );
                    Err(e.into())
                }
            }
        }
        Command::DevToken { uid, email, name, hours } => {
            let secret = config
                .jwt_secret
                .as_deref()
                .context("JWT_SECRET must be set to sign development tokens")?;
            let token = SharedSecretVerifier::new(secret).issue(
                &uid,
                email.as_deref(),
                name.as_deref(),
                chrono::Duration::hours(hours),
            )?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn token_provider(config: &AppConfig) -> anyhow::Result<SharedTokenProvider> {
    match &config.credentials_path {
        Some(path) if config.firestore_emulator_host.is_none() => {
            Ok(Arc::new(ServiceAccountTokenProvider::from_key_file(path).await?))
        }
        _ => Ok(Arc::new(NoopTokenProvider)),
    }
}

async fn sync_secrets(
    config: &AppConfig,
    secret: Option<String>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let project_id = config.project_id()?;
    let secret = secret.unwrap_or_else(|| config.firebase_config_secret.clone());

    let vault = SecretManagerVault::new(project_id, token_provider(config).await?);
    let raw = vault
        .access_secret(&secret)
        .await
        .with_context(|| format!("could not read secret {}", secret))?;
    let client_config = parse_secret(&raw)?;
    let lines = env_lines(&client_config);

    match out {
        Some(path) => {
            tokio::fs::write(&path, lines)
                .await
                .with_context(|| format!("could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), %secret, "client config written");
        }
        None => print!("{}", lines),
    }
    Ok(())
}

fn env_lines(config: &FirebaseClientConfig) -> String {
    let mut lines = vec![
        format!("FIREBASE_API_KEY={}", config.api_key),
        format!("FIREBASE_AUTH_DOMAIN={}", config.auth_domain),
        format!("FIREBASE_PROJECT_ID={}", config.project_id),
        format!("FIREBASE_STORAGE_BUCKET={}", config.storage_bucket),
        format!("FIREBASE_MESSAGING_SENDER_ID={}", config.messaging_sender_id),
        format!("FIREBASE_APP_ID={}", config.app_id),
    ];
    if let Some(measurement_id) = &config.measurement_id {
        lines.push(format!("FIREBASE_MEASUREMENT_ID={}", measurement_id));
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_lines_cover_every_field() {
        let mut config = FirebaseClientConfig::development();
        config.measurement_id = Some("G-123".into());
        let lines = env_lines(&config);
        assert!(lines.contains("FIREBASE_API_KEY=demo-api-key\n"));
        assert!(lines.contains("FIREBASE_APP_ID=1:000000000000:web:0000000000000000\n"));
        assert!(lines.ends_with("FIREBASE_MEASUREMENT_ID=G-123\n"));
    }

    #[test]
    fn reset_requires_a_target() {
        assert!(Cli::try_parse_from(["predictor-admin", "reset-leaderboard"]).is_err());
        let cli = Cli::try_parse_from(["predictor-admin", "reset-leaderboard", "season-2026", "--yes"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::ResetLeaderboard { yes: true, .. }
        ));
    }
}
