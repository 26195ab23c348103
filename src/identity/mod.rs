//! Identity directory
//!
//! Maps principal ids to user records. The directory is read-only from the
//! service's point of view; population happens through the `[users.<id>]`
//! tables of `idgate.toml`.

use crate::types::{AuthError, Principal};
use crate::utils::toml_config::IdgateConfigManager;
use std::sync::Arc;

/// Read-only lookup of principals by id.
pub trait IdentityDirectory: Send + Sync {
    /// Exact-match lookup of a principal.
    fn find_by_id(&self, id: &str) -> Result<Principal, AuthError>;

    /// Stored Argon2 PHC hash for a principal, if it is allowed to log in.
    fn password_hash(&self, id: &str) -> Option<String>;
}

/// Directory backed by the live configuration.
///
/// Every lookup reads the current config snapshot, so hot reloads are picked
/// up without rebuilding the directory.
#[derive(Clone)]
pub struct ConfigDirectory {
    config: Arc<IdgateConfigManager>,
}

impl ConfigDirectory {
    pub fn new(config: Arc<IdgateConfigManager>) -> Self {
        Self { config }
    }

    pub fn len(&self) -> usize {
        self.config.config().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityDirectory for ConfigDirectory {
    fn find_by_id(&self, id: &str) -> Result<Principal, AuthError> {
        let config = self.config.config();
        config
            .users
            .get(id)
            .map(|user| Principal {
                id: id.to_string(),
                display_name: user.display_name.clone(),
                email: user.email.clone(),
            })
            .ok_or_else(|| AuthError::PrincipalNotFound(id.to_string()))
    }

    fn password_hash(&self, id: &str) -> Option<String> {
        self.config
            .config()
            .users
            .get(id)
            .and_then(|user| user.password_hash.clone())
    }
}
