//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for idgate, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (`/api/v1`)
//! - `POST /api/v1/login` - Exchange username/password for a bearer token
//! - `POST /api/v1/logout` - Revoke the presented token
//! - `POST /api/v1/refresh` - Rotate the presented token
//!
//! ## Identity (`/api/v1`)
//! - `GET /api/v1/me` - Record of the authenticated principal
//! - `GET /api/v1/user/{id}` - Record of any principal by id
//!
//! ## Health
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! Everything except login and health requires a token in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```
//!
//! Every response body is JSON, errors included (`{"error": "<code>"}`).

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
