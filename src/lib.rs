//! # idgate - Bearer Token Identity Server
//!
//! A small authentication and identity-lookup service built on Axum. It
//! issues opaque session tokens on login, validates `Authorization: Bearer`
//! headers on protected routes, and resolves principals from a directory
//! seeded through configuration.
//!
//! ## Overview
//!
//! idgate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `idgate-server` binary
//! 2. **As a library** - Embed the router or the token store in your own service
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use idgate::{AppState, IdgateConfigManager};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(IdgateConfigManager::new("idgate.toml")?);
//! let state = AppState::from_config_manager(config_manager);
//! let app = idgate::api::routes::create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST handlers and the router
//! - [`auth`] - Token store, credential verification, middleware
//! - [`identity`] - Principal directory
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading and hot reload

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Session tokens, credentials, and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Principal directory.
pub mod identity;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use auth::credentials::{CredentialVerifier, PasswordVerifier};
pub use auth::token_store::{Clock, SystemClock, TokenStore};
pub use identity::{ConfigDirectory, IdentityDirectory};
pub use types::{AppError, AuthError, Principal, Result, Token};
pub use utils::toml_config::{IdgateConfig, IdgateConfigManager};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<IdgateConfigManager>,
    /// Principal lookup
    pub directory: Arc<dyn IdentityDirectory>,
    /// Login credential check
    pub verifier: Arc<dyn CredentialVerifier>,
    /// Active session tokens
    pub token_store: Arc<TokenStore>,
}

impl AppState {
    /// Wires the default components from a configuration manager.
    pub fn from_config_manager(config_manager: Arc<IdgateConfigManager>) -> Self {
        Self::with_clock(config_manager, Arc::new(SystemClock))
    }

    /// Same as [`AppState::from_config_manager`] with an explicit clock.
    pub fn with_clock(config_manager: Arc<IdgateConfigManager>, clock: Arc<dyn Clock>) -> Self {
        let directory: Arc<dyn IdentityDirectory> =
            Arc::new(ConfigDirectory::new(config_manager.clone()));
        let verifier: Arc<dyn CredentialVerifier> =
            Arc::new(PasswordVerifier::new(directory.clone()));
        let ttl = config_manager.config().auth.token_ttl();
        let token_store = Arc::new(TokenStore::with_clock(directory.clone(), ttl, clock));

        Self {
            config_manager,
            directory,
            verifier,
            token_store,
        }
    }
}
