//! Shared fixtures for integration tests.

#![allow(dead_code)]

pub mod mocks;

use axum_test::TestServer;
use chrono::Utc;
use idgate::auth::credentials::hash_password;
use idgate::auth::token_store::ManualClock;
use idgate::utils::toml_config::{IdgateConfig, IdgateConfigManager, UserConfig};
use idgate::{api::routes::create_router, AppState};
use std::sync::{Arc, OnceLock};

pub const ALICE_PASSWORD: &str = "alice-password";
pub const BOB_PASSWORD: &str = "bob-password";

/// Base config with alice and bob able to log in and carol lookup-only.
///
/// Hashed once per test binary; Argon2 is slow in debug builds.
pub fn test_config() -> IdgateConfig {
    static CONFIG: OnceLock<IdgateConfig> = OnceLock::new();
    CONFIG
        .get_or_init(|| {
            let mut config = IdgateConfig::default();
            config.auth.token_ttl_secs = 3600;
            config.users.insert(
                "alice".to_string(),
                UserConfig {
                    display_name: "Alice".to_string(),
                    email: Some("alice@example.com".to_string()),
                    password_hash: Some(hash_password(ALICE_PASSWORD).expect("hash alice")),
                },
            );
            config.users.insert(
                "bob".to_string(),
                UserConfig {
                    display_name: "Bob".to_string(),
                    email: None,
                    password_hash: Some(hash_password(BOB_PASSWORD).expect("hash bob")),
                },
            );
            config.users.insert(
                "carol".to_string(),
                UserConfig {
                    display_name: "Carol".to_string(),
                    email: None,
                    password_hash: None,
                },
            );
            config
        })
        .clone()
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
}

/// Create a test app over the default components and a manual clock
pub fn create_test_app() -> TestApp {
    let config_manager = Arc::new(IdgateConfigManager::from_config(test_config()));
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = AppState::with_clock(config_manager, clock.clone());
    let server =
        TestServer::new(create_router(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        clock,
    }
}

/// Create a test app whose credential check is replaced
pub fn create_test_app_with_verifier<F>(make: F) -> TestApp
where
    F: FnOnce(&AppState) -> Arc<dyn idgate::CredentialVerifier>,
{
    let config_manager = Arc::new(IdgateConfigManager::from_config(test_config()));
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let mut state = AppState::with_clock(config_manager, clock.clone());
    state.verifier = make(&state);
    let server =
        TestServer::new(create_router(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        clock,
    }
}

/// Log in through the API and return the bearer value
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/v1/login")
        .json(&serde_json::json!({ "username": username, "password": password }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    body["token"]
        .as_str()
        .expect("login response should carry a token")
        .to_string()
}
