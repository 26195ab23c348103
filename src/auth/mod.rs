//! Session Tokens and Middleware
//!
//! This module provides the authentication infrastructure for the idgate API:
//! opaque session token issuance and validation, credential verification, and
//! the Axum middleware guarding protected routes.
//!
//! # Module Structure
//!
//! - [`auth::token_store`](crate::auth::token_store) - Token issue, validate, revoke, rotate
//! - [`auth::credentials`](crate::auth::credentials) - Pluggable login verification (Argon2)
//! - [`auth::middleware`](crate::auth::middleware) - Bearer extraction and `AuthUser`
//! - [`auth::sweeper`](crate::auth::sweeper) - Background eviction of expired and orphaned tokens
//!
//! # Security Features
//!
//! - **Opaque Tokens**: 256 random bits from the thread-local CSPRNG, hex-encoded
//! - **Password Hashing**: Argon2id PHC strings, verified off the async workers
//! - **Uniform Failures**: every header/token failure is the same 401 body;
//!   the reason only appears in logs
//!
//! # Usage
//!
//! ## Middleware
//!
//! The `auth_middleware` layer validates bearer tokens and injects an
//! `AuthSession` into the request extensions:
//!
//! ```ignore
//! use axum::middleware;
//! use idgate::auth::middleware::auth_middleware;
//!
//! let app = Router::new()
//!     .route("/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(token_store, auth_middleware));
//! ```
//!
//! ## Extracting the Session in Handlers
//!
//! ```ignore
//! async fn protected_handler(AuthUser(session): AuthUser) -> impl IntoResponse {
//!     format!("Hello, {}!", session.principal.display_name)
//! }
//! ```
//!
//! # Configuration
//!
//! Configure via `idgate.toml`:
//! ```toml
//! [auth]
//! token_ttl_secs = 86400      # Token validity duration
//! sweep_interval_secs = 300   # Expired token sweep period, 0 disables
//! ```

/// Credential verification and password hashing.
pub mod credentials;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Background expiry sweeper.
pub mod sweeper;
/// In-memory session token store.
pub mod token_store;
