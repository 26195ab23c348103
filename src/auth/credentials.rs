use crate::identity::IdentityDirectory;
use crate::types::{AppError, AuthError, Principal, Result};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString,
    },
    Argon2,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Verified against when the account is unknown or has no hash, so a failed
/// login costs the same whether or not the username exists.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$Q8U7bJ8RzQ9aP5r2ekqjzL4uNwZ3Xl0kqY2tP9yQx1A";

/// Pluggable check of login credentials.
///
/// Implementations must not reveal whether the identifier or the secret was
/// wrong; both surface as [`AuthError::InvalidCredentials`].
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, username: &str, password: &str) -> Result<Principal>;
}

/// Hashes a password using Argon2id.
///
/// Returns a PHC-formatted hash string suitable for `password_hash` in
/// `idgate.toml`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn check_password(password: &str, stored: Option<&str>) -> bool {
    let argon2 = Argon2::default();
    match stored.and_then(|h| PasswordHash::new(h).ok()) {
        Some(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        None => {
            if let Ok(dummy) = PasswordHash::new(DUMMY_HASH) {
                let _ = argon2.verify_password(password.as_bytes(), &dummy);
            }
            false
        }
    }
}

/// Verifies passwords against Argon2 hashes held by the identity directory.
pub struct PasswordVerifier {
    directory: Arc<dyn IdentityDirectory>,
}

impl PasswordVerifier {
    pub fn new(directory: Arc<dyn IdentityDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl CredentialVerifier for PasswordVerifier {
    async fn verify(&self, username: &str, password: &str) -> Result<Principal> {
        let stored = self.directory.password_hash(username);
        let password = password.to_string();

        // Argon2 is deliberately slow; keep it off the async workers
        let matched =
            tokio::task::spawn_blocking(move || check_password(&password, stored.as_deref()))
                .await
                .map_err(|e| AppError::Internal(format!("password check failed: {}", e)))?;

        if !matched {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.directory
            .find_by_id(username)
            .map_err(|_| AuthError::InvalidCredentials.into())
    }
}
