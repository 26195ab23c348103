use crate::identity::IdentityDirectory;
use crate::types::{AuthError, Principal, Token};
use crate::utils::toml_config::MAX_TOKEN_TTL_SECS;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Token byte length before hex encoding (32 bytes = 64 hex chars).
const TOKEN_BYTES: usize = 32;

/// Source of the current time for expiry decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used in tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Short, non-reversible identifier for a token value, safe to log.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..6])
}

fn generate_value() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// In-memory session token store.
///
/// Owns the token → session mapping. All writes go through this type; the
/// auth middleware only calls [`TokenStore::validate`]. Operations on the same
/// token value serialize on a single lock, so a returned `revoke` is observed
/// by every later `validate`.
pub struct TokenStore {
    tokens: RwLock<HashMap<String, Token>>,
    directory: Arc<dyn IdentityDirectory>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TokenStore {
    /// Creates a store issuing tokens valid for `ttl`.
    ///
    /// # Arguments
    /// * `directory` - Resolves principal ids during validation
    /// * `ttl` - Token lifetime, clamped to between one second and ten years
    pub fn new(directory: Arc<dyn IdentityDirectory>, ttl: Duration) -> Self {
        Self::with_clock(directory, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        directory: Arc<dyn IdentityDirectory>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // expires_at must be strictly after issued_at
        let ttl = ttl.clamp(
            Duration::seconds(1),
            Duration::seconds(MAX_TOKEN_TTL_SECS as i64),
        );
        Self {
            tokens: RwLock::new(HashMap::new()),
            directory,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a fresh token for a principal and records it.
    pub fn issue(&self, principal_id: &str) -> Token {
        let now = self.clock.now();
        let mut tokens = self.tokens.write();
        let token = self.insert_locked(&mut tokens, principal_id, now);
        drop(tokens);

        tracing::info!(
            principal_id = %principal_id,
            token = %fingerprint(&token.value),
            expires_at = %token.expires_at,
            "token issued"
        );
        token
    }

    fn insert_locked(
        &self,
        tokens: &mut HashMap<String, Token>,
        principal_id: &str,
        now: DateTime<Utc>,
    ) -> Token {
        // 256 random bits; a collision is astronomically unlikely but cheap to rule out
        let value = loop {
            let candidate = generate_value();
            if !tokens.contains_key(&candidate) {
                break candidate;
            }
        };

        let token = Token {
            value: value.clone(),
            principal_id: principal_id.to_string(),
            issued_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        tokens.insert(value, token.clone());
        token
    }

    /// Resolves a token value to its principal.
    ///
    /// Expired tokens are evicted as a side effect, so a second call on the
    /// same value reports [`AuthError::TokenNotFound`]. A token whose principal
    /// has left the directory is revoked.
    pub fn validate(&self, value: &str) -> Result<Principal, AuthError> {
        let now = self.clock.now();

        let principal_id = {
            let tokens = self.tokens.read();
            match tokens.get(value) {
                None => return Err(AuthError::TokenNotFound),
                Some(token) if token.is_expired_at(now) => None,
                Some(token) => Some(token.principal_id.clone()),
            }
        };

        let Some(principal_id) = principal_id else {
            self.evict_if_expired(value, now);
            tracing::debug!(token = %fingerprint(value), "expired token evicted");
            return Err(AuthError::TokenExpired);
        };

        match self.directory.find_by_id(&principal_id) {
            Ok(principal) => Ok(principal),
            Err(err) => {
                self.tokens.write().remove(value);
                tracing::warn!(
                    principal_id = %principal_id,
                    token = %fingerprint(value),
                    "token bound to unknown principal revoked"
                );
                Err(err)
            }
        }
    }

    fn evict_if_expired(&self, value: &str, now: DateTime<Utc>) {
        let mut tokens = self.tokens.write();
        // Re-check under the write lock; the entry may have been replaced
        if tokens.get(value).is_some_and(|t| t.is_expired_at(now)) {
            tokens.remove(value);
        }
    }

    /// Removes a token. Revoking an unknown token is not an error.
    ///
    /// Returns whether a token was actually removed.
    pub fn revoke(&self, value: &str) -> bool {
        let removed = self.tokens.write().remove(value).is_some();
        if removed {
            tracing::info!(token = %fingerprint(value), "token revoked");
        }
        removed
    }

    /// Replaces a valid token with a new one for the same principal.
    pub fn rotate(&self, value: &str) -> Result<Token, AuthError> {
        let now = self.clock.now();
        let mut tokens = self.tokens.write();

        let principal_id = match tokens.get(value) {
            None => return Err(AuthError::TokenNotFound),
            Some(token) if token.is_expired_at(now) => {
                tokens.remove(value);
                return Err(AuthError::TokenExpired);
            }
            Some(token) => token.principal_id.clone(),
        };

        let fresh = self.insert_locked(&mut tokens, &principal_id, now);
        tokens.remove(value);
        drop(tokens);

        tracing::info!(
            principal_id = %principal_id,
            old = %fingerprint(value),
            new = %fingerprint(&fresh.value),
            "token rotated"
        );
        Ok(fresh)
    }

    /// Revokes every token held by a principal.
    pub fn revoke_principal(&self, principal_id: &str) -> usize {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| t.principal_id != principal_id);
        let count = before - tokens.len();
        drop(tokens);

        tracing::info!(principal_id = %principal_id, count, "principal tokens revoked");
        count
    }

    /// Evicts all expired tokens, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| !t.is_expired_at(now));
        before - tokens.len()
    }

    pub fn active_count(&self) -> usize {
        self.tokens.read().len()
    }
}
