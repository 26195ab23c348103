use crate::auth::token_store::TokenStore;
use crate::utils::toml_config::IdgateConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Spawns a task that evicts expired tokens every `interval`.
///
/// `validate` already evicts lazily; this keeps tokens that are never
/// presented again from accumulating. Abort the returned handle to stop it.
pub fn spawn_expiry_sweeper(tokens: Arc<TokenStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = tokens.purge_expired();
            if purged > 0 {
                tracing::info!(purged, remaining = tokens.active_count(), "expired tokens swept");
            } else {
                tracing::trace!("expiry sweep found nothing");
            }
        }
    })
}

/// Spawns a task that revokes the tokens of users dropped by a config change.
///
/// `validate` would reject those tokens on next use anyway; revoking them up
/// front keeps `active_count` honest. Ends when the config manager is dropped.
pub fn spawn_departed_user_revoker(
    tokens: Arc<TokenStore>,
    mut changes: watch::Receiver<Arc<IdgateConfig>>,
) -> JoinHandle<()> {
    // Snapshot before spawning so a change racing the task start is not missed
    let mut known: BTreeSet<String> =
        changes.borrow_and_update().users.keys().cloned().collect();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let current: BTreeSet<String> =
                changes.borrow_and_update().users.keys().cloned().collect();

            for departed in known.difference(&current) {
                tokens.revoke_principal(departed);
            }
            known = current;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token_store::ManualClock;
    use crate::identity::ConfigDirectory;
    use crate::utils::toml_config::{IdgateConfig, IdgateConfigManager, UserConfig};
    use chrono::Utc;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_expired_tokens() {
        let mut config = IdgateConfig::default();
        config.users.insert(
            "alice".to_string(),
            UserConfig {
                display_name: "Alice".to_string(),
                email: None,
                password_hash: None,
            },
        );
        let manager = Arc::new(IdgateConfigManager::from_config(config));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(TokenStore::with_clock(
            Arc::new(ConfigDirectory::new(manager)),
            chrono::Duration::seconds(60),
            clock.clone(),
        ));

        store.issue("alice");
        store.issue("alice");
        clock.advance(chrono::Duration::seconds(120));

        let handle = spawn_expiry_sweeper(store.clone(), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(11)).await;

        assert_eq!(store.active_count(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn test_removed_user_tokens_revoked_on_config_change() {
        let mut config = IdgateConfig::default();
        for id in ["alice", "bob"] {
            config.users.insert(
                id.to_string(),
                UserConfig {
                    display_name: id.to_string(),
                    email: None,
                    password_hash: None,
                },
            );
        }
        let manager = Arc::new(IdgateConfigManager::from_config(config));
        let store = Arc::new(TokenStore::new(
            Arc::new(ConfigDirectory::new(manager.clone())),
            chrono::Duration::hours(1),
        ));
        let alice = store.issue("alice");
        store.issue("bob");
        store.issue("bob");

        let handle = spawn_departed_user_revoker(store.clone(), manager.subscribe());

        let mut next = (*manager.config()).clone();
        next.users.remove("bob");
        manager.replace(next).unwrap();

        for _ in 0..100 {
            if store.active_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.validate(&alice.value).map(|p| p.id), Ok("alice".to_string()));
        handle.abort();
    }
}
