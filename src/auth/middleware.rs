use crate::auth::token_store::TokenStore;
use crate::types::{AppError, AuthError, Principal};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Resolved caller identity attached to a request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub principal: Principal,
    /// The bearer value the request was authenticated with
    pub token: String,
}

/// Pulls the token out of an `Authorization: Bearer <value>` header.
///
/// The scheme is matched case-insensitively. A missing header, a different
/// scheme, or an empty value is a [`AuthError::MalformedHeader`].
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MalformedHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}

pub async fn auth_middleware(
    State(tokens): State<Arc<TokenStore>>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = extract_bearer(req.headers()).and_then(|token| {
        tokens.validate(token).map(|principal| AuthSession {
            principal,
            token: token.to_string(),
        })
    });

    match session {
        Ok(session) => {
            tracing::debug!(principal_id = %session.principal.id, "request authenticated");
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        // Every failure here is a 401, including a principal that vanished
        Err(err) => AppError::Unauthorized(err).into_response(),
    }
}

// Extractor for the authenticated session
pub struct AuthUser(pub AuthSession);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized(AuthError::MalformedHeader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[rstest]
    #[case("Bearer abc123", "abc123")]
    #[case("bearer abc123", "abc123")]
    #[case("BEARER   abc123  ", "abc123")]
    fn test_extract_bearer_accepts(#[case] header_value: &str, #[case] expected: &str) {
        let headers = headers_with(header_value);
        assert_eq!(extract_bearer(&headers), Ok(expected));
    }

    #[rstest]
    #[case("Bearer")]
    #[case("Bearer    ")]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("abc123")]
    #[case("")]
    fn test_extract_bearer_rejects(#[case] header_value: &str) {
        let headers = headers_with(header_value);
        assert_eq!(extract_bearer(&headers), Err(AuthError::MalformedHeader));
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        assert_eq!(
            extract_bearer(&HeaderMap::new()),
            Err(AuthError::MalformedHeader)
        );
    }

    #[test]
    fn test_extract_bearer_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
        );
        assert_eq!(extract_bearer(&headers), Err(AuthError::MalformedHeader));
    }
}
