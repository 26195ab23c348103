//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Authentication handlers (login, logout, refresh).
pub mod auth;
/// Health check and fallback handlers.
pub mod health;
/// Principal lookup handlers (me, user by id).
pub mod users;
