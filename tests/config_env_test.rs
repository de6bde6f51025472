use std::env;

use serial_test::serial;

use cricket_predictor::config::{AppConfig, ConfigError, StoreBackend};

const VARS: [&str; 6] = [
    "APP_ENV",
    "PORT",
    "ALLOW_FALLBACK_CONFIG",
    "STORE_BACKEND",
    "FIREBASE_PROJECT_ID",
    "FIREBASE_CONFIG_SECRET",
];

fn clear() {
    for name in VARS {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn production_disables_the_fallback_config() {
    clear();
    env::set_var("APP_ENV", "production");
    env::set_var("FIREBASE_PROJECT_ID", "cricket-prod");

    let config = AppConfig::from_env().unwrap();
    assert!(config.is_production());
    assert!(!config.allow_fallback_config);
    assert_eq!(config.project_id(), Ok("cricket-prod"));
    assert_eq!(config.firebase_config_secret, "firebase-client-config");
    clear();
}

#[test]
#[serial]
fn development_defaults() {
    clear();
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.app_env, "development");
    assert_eq!(config.port, 10000);
    assert!(config.allow_fallback_config);
    assert_eq!(config.store_backend, StoreBackend::Firestore);
    assert_eq!(config.project_id(), Err(ConfigError::Missing("FIREBASE_PROJECT_ID")));
}

#[test]
#[serial]
fn invalid_values_are_errors() {
    clear();
    env::set_var("PORT", "ten");
    assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::InvalidValue { name: "PORT", .. })
    ));

    env::remove_var("PORT");
    env::set_var("STORE_BACKEND", "mongodb");
    assert!(matches!(
        AppConfig::from_env(),
        Err(ConfigError::InvalidValue { name: "STORE_BACKEND", .. })
    ));
    clear();
}
