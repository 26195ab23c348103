//! TOML-based configuration for idgate
//!
//! This module provides declarative configuration for the server, token
//! lifetimes, and the seeded user directory via a TOML file (`idgate.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `IdgateConfigManager` for thread-safe access to the current configuration.
//! The identity directory reads through the manager, so edits to `[users.*]`
//! take effect without a restart.

use arc_swap::ArcSwap;
use argon2::password_hash::PasswordHash;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Root configuration structure loaded from idgate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdgateConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Seeded principals keyed by id
    #[serde(default)]
    pub users: BTreeMap<String, UserConfig>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Session token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// How often the background sweeper evicts expired tokens. Zero disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

/// Upper bound for `auth.token_ttl_secs` (ten years)
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

fn default_token_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AuthConfig {
    /// Token lifetime, saturated at [`MAX_TOKEN_TTL_SECS`]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64)
    }
}

// ============= User Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Argon2 PHC string. Users without one can be looked up but cannot log in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

// ============= Validation =============

/// Non-fatal configuration findings
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    NoUsers,
    LoginDisabled,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid password hash for user '{0}': {1}")]
    InvalidPasswordHash(String, String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl IdgateConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config: IdgateConfig = toml::from_str(&content)?;
        config.apply_env_overrides()?;

        config.validate()?;

        Ok(config)
    }

    /// Apply `IDGATE_HOST` / `IDGATE_PORT` on top of the file values
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("IDGATE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("IDGATE_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("IDGATE_PORT is not a valid port: {}", port))
            })?;
        }
        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be at most {} (ten years)",
                MAX_TOKEN_TTL_SECS
            )));
        }

        for (id, user) in &self.users {
            if id.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "user ids must not be empty".to_string(),
                ));
            }
            if user.display_name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "user '{}' has an empty display_name",
                    id
                )));
            }
            if let Some(ref hash) = user.password_hash {
                PasswordHash::new(hash)
                    .map_err(|e| ConfigError::InvalidPasswordHash(id.clone(), e.to_string()))?;
            }
        }

        Ok(())
    }

    /// Validate configuration with warnings for unusable entries
    ///
    /// Returns Ok with warnings, or Err if validation fails
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        if self.users.is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoUsers,
                message: "No users are configured; every login will be rejected".to_string(),
            });
        }

        warnings.extend(
            self.users
                .iter()
                .filter(|(_, user)| user.password_hash.is_none())
                .map(|(id, _)| ConfigWarning {
                    kind: ConfigWarningKind::LoginDisabled,
                    message: format!("User '{}' has no password_hash and cannot log in", id),
                }),
        );

        Ok(warnings)
    }
}

// ============= Config Manager =============

/// Quiet period that ends a burst of file events before a reload
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(300);

/// Thread-safe holder for the current configuration with optional hot reload
pub struct IdgateConfigManager {
    config: Arc<ArcSwap<IdgateConfig>>,
    changes: Arc<watch::Sender<Arc<IdgateConfig>>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

fn publish(
    config: &ArcSwap<IdgateConfig>,
    changes: &watch::Sender<Arc<IdgateConfig>>,
    next: IdgateConfig,
) {
    let next = Arc::new(next);
    config.store(next.clone());
    changes.send_replace(next);
}

impl IdgateConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Convert to absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = IdgateConfig::load(&path)?;

        Ok(Self::build(config, path))
    }

    fn build(config: IdgateConfig, config_path: PathBuf) -> Self {
        let config = Arc::new(config);
        let (changes, _) = watch::channel(config.clone());
        Self {
            config: Arc::new(ArcSwap::new(config)),
            changes: Arc::new(changes),
            config_path,
            watcher: RwLock::new(None),
        }
    }

    /// Create a config manager directly from a config (useful for testing)
    /// This won't have file watching capabilities.
    pub fn from_config(config: IdgateConfig) -> Self {
        Self::build(config, PathBuf::from("idgate.toml"))
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<IdgateConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Receiver that observes every configuration applied after this call
    pub fn subscribe(&self) -> watch::Receiver<Arc<IdgateConfig>> {
        self.changes.subscribe()
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!(path = ?self.config_path, "Reloading configuration");

        let new_config = IdgateConfig::load(&self.config_path)?;
        publish(&self.config, &self.changes, new_config);

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Replace the configuration in memory, after validating it
    pub fn replace(&self, config: IdgateConfig) -> Result<(), ConfigError> {
        config.validate()?;
        publish(&self.config, &self.changes, config);
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let changes = Arc::clone(&self.changes);
        let file_name = config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        // Watch the parent directory so editors that replace the file are seen
        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                // Trailing edge: reload once the burst has been quiet for a while,
                // so the last write of the burst is the one applied
                while let Ok(Some(())) = tokio::time::timeout(RELOAD_DEBOUNCE, rx.recv()).await {}

                match IdgateConfig::load(&config_path) {
                    Ok(new_config) => {
                        let users = new_config.users.len();
                        publish(&config_arc, &changes, new_config);
                        info!(users, "Configuration hot-reloaded successfully");
                    }
                    Err(e) => {
                        warn!(
                            "Failed to hot-reload config: {}. Keeping previous config.",
                            e
                        );
                    }
                }
            }
        });

        info!(path = %self.config_path.display(), "Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}
