use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Identity Types =============

/// An authenticated actor, as exposed to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// An active bearer session. Never mutated once issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub principal_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// A token is still valid at exactly `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            token: token.value,
            token_type: "Bearer".to_string(),
            expires_at: token.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_tokens: usize,
}

// ============= Error Types =============

/// Internal reasons an authentication step failed.
///
/// The distinction between kinds is for diagnostics only. Header and token
/// failures all reach the client as the same generic 401.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("token not found")]
    TokenNotFound,

    #[error("token expired")]
    TokenExpired,

    #[error("principal not found: {0}")]
    PrincipalNotFound(String),
}

impl AuthError {
    /// Stable snake_case name used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::TokenNotFound => "token_not_found",
            AuthError::TokenExpired => "token_expired",
            AuthError::PrincipalNotFound(_) => "principal_not_found",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::PrincipalNotFound(id) => AppError::NotFound(id),
            other => AppError::Unauthorized(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, code) = match &self {
            AppError::Unauthorized(err) => {
                tracing::warn!(kind = err.kind(), "rejected unauthenticated request");
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AppError::InvalidCredentials => {
                tracing::info!(kind = "invalid_credentials", "login rejected");
                (StatusCode::UNAUTHORIZED, "invalid_credentials")
            }
            AppError::NotFound(what) => {
                tracing::debug!(what = %what, "resource not found");
                (StatusCode::NOT_FOUND, "not_found")
            }
            AppError::InvalidInput(msg) => {
                tracing::debug!(reason = %msg, "invalid request");
                (StatusCode::BAD_REQUEST, "invalid_request")
            }
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed"),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let body = serde_json::json!({
            "error": code
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
