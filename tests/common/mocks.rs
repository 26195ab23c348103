//! Mock implementations for testing.
//!
//! Stand-ins for the pluggable seams so tests can exercise the HTTP layer
//! without Argon2 hashing on every login.

use async_trait::async_trait;
use idgate::types::{AppError, AuthError, Result};
use idgate::{CredentialVerifier, IdentityDirectory, Principal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Accepts any known principal whose password equals the shared secret.
pub struct MockVerifier {
    directory: Arc<dyn IdentityDirectory>,
    secret: String,
    calls: AtomicUsize,
}

impl MockVerifier {
    pub fn new(directory: Arc<dyn IdentityDirectory>, secret: &str) -> Self {
        Self {
            directory,
            secret: secret.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVerifier for MockVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Principal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if password != self.secret {
            return Err(AppError::InvalidCredentials);
        }
        self.directory
            .find_by_id(username)
            .map_err(|_| AuthError::InvalidCredentials.into())
    }
}
