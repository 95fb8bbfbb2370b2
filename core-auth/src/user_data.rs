//! Saved User Credentials
//!
//! Single-slot persistence for the username and activation key the user
//! asked the app to remember.
//!
//! ## Record format
//!
//! The record is stored as JSON under [`USER_DATA_KEY`]:
//!
//! ```json
//! {"username":"alice","activationKey":"KEY123","isSaved":true,"savedAt":"2024-05-01T10:00:00Z"}
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::UserDataStore;
//! # use bridge_traits::{storage::KeyValueStore, time::SystemClock};
//! # use core_runtime::events::EventBus;
//! # use std::sync::Arc;
//! # async fn example(kv: Arc<dyn KeyValueStore>) -> core_auth::Result<()> {
//! let store = UserDataStore::new(kv, Arc::new(SystemClock), EventBus::default());
//!
//! store.save("alice", "KEY123").await?;
//! assert!(store.has_saved_data().await);
//!
//! store.clear().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use core_runtime::events::{AccountEvent, CoreEvent, EventBus, Notice};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

/// Storage key of the saved credentials record
pub const USER_DATA_KEY: &str = "saved_user_data";

/// The saved credentials record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCredentials {
    pub username: String,
    pub activation_key: String,
    pub is_saved: bool,
    pub saved_at: DateTime<Utc>,
}

// Custom Debug implementation to avoid logging activation keys
impl fmt::Debug for SavedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedCredentials")
            .field("username", &self.username)
            .field("activation_key", &"[REDACTED]")
            .field("is_saved", &self.is_saved)
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Single-slot credential store
///
/// Cheap to clone; all clones share the same slot.
#[derive(Clone)]
pub struct UserDataStore {
    current: Arc<RwLock<Option<SavedCredentials>>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl UserDataStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        debug!("Initializing UserDataStore");
        Self {
            current: Arc::new(RwLock::new(None)),
            store,
            clock,
            events,
        }
    }

    /// Save credentials, replacing whatever was saved before. The activation
    /// key is stored exactly as given.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidInput`] for a blank username or activation key
    /// - [`AuthError::Persistence`] when the record could not be written; the
    ///   previously saved credentials stay in place
    pub async fn save(&self, username: &str, activation_key: &str) -> Result<SavedCredentials> {
        let username = username.trim();
        if username.is_empty() {
            return Err(self.fail(invalid_input("username", "Username cannot be empty")));
        }
        if activation_key.trim().is_empty() {
            return Err(self.fail(invalid_input(
                "activation_key",
                "Activation key cannot be empty",
            )));
        }

        let record = SavedCredentials {
            username: username.to_string(),
            activation_key: activation_key.to_string(),
            is_saved: true,
            saved_at: self.clock.now(),
        };

        let mut current = self.current.write().await;
        let json = serde_json::to_string(&record).map_err(|e| self.fail(e.into()))?;
        if let Err(e) = self.store.set(USER_DATA_KEY, &json).await {
            warn!(error = %e, "Failed to write saved credentials");
            return Err(self.fail(AuthError::Persistence(e.to_string())));
        }
        *current = Some(record.clone());
        drop(current);

        info!(username = %record.username, "Saved user credentials");
        self.publish(AccountEvent::CredentialsSaved {
            username: record.username.clone(),
        });
        self.events.notify(Notice::success(
            "Information Saved",
            format!("The data for {} was saved", record.username),
        ));
        Ok(record)
    }

    /// Restore the saved record. Never fails: an unreadable or missing record
    /// means nothing is saved, and a corrupted record is removed.
    pub async fn load(&self) -> Option<SavedCredentials> {
        let mut current = self.current.write().await;

        let loaded = match self.store.get(USER_DATA_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<SavedCredentials>(&raw) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Removing malformed saved credentials");
                    if let Err(e) = self.store.remove(USER_DATA_KEY).await {
                        warn!(error = %e, "Failed to remove malformed saved credentials");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read saved credentials");
                None
            }
        };

        *current = loaded.clone();
        drop(current);

        match &loaded {
            Some(record) => {
                debug!(username = %record.username, saved_at = %record.saved_at, "Loaded saved credentials");
                self.publish(AccountEvent::CredentialsLoaded {
                    username: record.username.clone(),
                });
            }
            None => debug!("No saved credentials"),
        }
        loaded
    }

    /// Remove the saved record. Clearing an empty slot succeeds.
    ///
    /// # Errors
    ///
    /// [`AuthError::Persistence`] when the record could not be removed; the
    /// in-memory record is kept.
    pub async fn clear(&self) -> Result<()> {
        let mut current = self.current.write().await;
        if let Err(e) = self.store.remove(USER_DATA_KEY).await {
            warn!(error = %e, "Failed to remove saved credentials");
            return Err(self.fail(AuthError::Persistence(e.to_string())));
        }
        *current = None;
        drop(current);

        info!("Cleared saved credentials");
        self.publish(AccountEvent::CredentialsCleared);
        self.events.notify(Notice::success(
            "Data Removed",
            "The saved information was removed",
        ));
        Ok(())
    }

    pub async fn current(&self) -> Option<SavedCredentials> {
        self.current.read().await.clone()
    }

    pub async fn has_saved_data(&self) -> bool {
        self.current.read().await.is_some()
    }

    fn fail(&self, error: AuthError) -> AuthError {
        self.events
            .notify(Notice::error("Error", error.to_string()));
        error
    }

    fn publish(&self, event: AccountEvent) {
        if self.events.emit(CoreEvent::Account(event)).is_err() {
            trace!("No subscribers for account event");
        }
    }
}

fn invalid_input(field: &str, message: &str) -> AuthError {
    AuthError::InvalidInput {
        field: field.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::time::ManualClock;
    use core_runtime::events::{EventStream, NoticeKind};
    use mockall::mock;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        data: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn get(&self, key: &str) -> BridgeResult<Option<String>> {
            Ok(self.data.lock().await.get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str) -> BridgeResult<()> {
            self.data
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> BridgeResult<()> {
            self.data.lock().await.remove(key);
            Ok(())
        }
    }

    mock! {
        Store {}

        #[async_trait]
        impl KeyValueStore for Store {
            async fn get(&self, key: &str) -> BridgeResult<Option<String>>;
            async fn set(&self, key: &str, value: &str) -> BridgeResult<()>;
            async fn remove(&self, key: &str) -> BridgeResult<()>;
        }
    }

    fn user_store(kv: Arc<dyn KeyValueStore>) -> (UserDataStore, EventStream) {
        let events = EventBus::new(64);
        let stream = EventStream::new(events.subscribe());
        (
            UserDataStore::new(kv, Arc::new(ManualClock::default()), events),
            stream,
        )
    }

    fn notice_kinds(stream: &mut EventStream) -> Vec<NoticeKind> {
        stream
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                CoreEvent::Notice(notice) => Some(notice.kind),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_save_then_load_on_fresh_store() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let (store, mut events) = user_store(kv.clone());

        let saved = store.save("alice", "KEY123").await.unwrap();
        assert!(saved.is_saved);
        assert_eq!(notice_kinds(&mut events), vec![NoticeKind::Success]);

        let (restarted, _) = user_store(kv);
        assert!(!restarted.has_saved_data().await);
        let loaded = restarted.load().await.unwrap();

        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.activation_key, "KEY123");
        assert_eq!(loaded, saved);
        assert!(restarted.has_saved_data().await);
    }

    #[tokio::test]
    async fn test_record_uses_camel_case_fields() {
        let kv = Arc::new(MemoryStore::default());
        let (store, _) = user_store(kv.clone());
        store.save("alice", "KEY123").await.unwrap();

        let raw = kv.get(USER_DATA_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["activationKey"], "KEY123");
        assert_eq!(json["isSaved"], true);
        assert!(json["savedAt"].is_string());
    }

    #[tokio::test]
    async fn test_save_overwrites_single_slot() {
        let (store, _) = user_store(Arc::new(MemoryStore::default()));
        store.save("alice", "KEY123").await.unwrap();
        store.save("bob", "KEY456").await.unwrap();

        let current = store.current().await.unwrap();
        assert_eq!(current.username, "bob");
        assert_eq!(current.activation_key, "KEY456");
    }

    #[tokio::test]
    async fn test_save_rejects_blank_fields() {
        let (store, mut events) = user_store(Arc::new(MemoryStore::default()));

        let err = store.save("  ", "KEY").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput { ref field, .. } if field == "username"));

        let err = store.save("alice", "").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput { ref field, .. } if field == "activation_key"));

        let err = store.save("alice", " \t ").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput { ref field, .. } if field == "activation_key"));

        assert!(!store.has_saved_data().await);
        assert_eq!(
            notice_kinds(&mut events),
            vec![NoticeKind::Error, NoticeKind::Error, NoticeKind::Error]
        );
    }

    #[tokio::test]
    async fn test_activation_key_stored_verbatim() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
        let (store, _) = user_store(kv.clone());

        let saved = store.save("alice", "  KEY 123 ").await.unwrap();
        assert_eq!(saved.activation_key, "  KEY 123 ");

        let (fresh, _) = user_store(kv);
        let loaded = fresh.load().await.unwrap();
        assert_eq!(loaded.activation_key, "  KEY 123 ");
    }

    #[tokio::test]
    async fn test_save_failure_keeps_previous_record() {
        let mut kv = MockStore::new();
        let mut writes = 0;
        kv.expect_set().returning(move |_, _| {
            writes += 1;
            if writes == 1 {
                Ok(())
            } else {
                Err(BridgeError::StorageError("quota exceeded".into()))
            }
        });
        let (store, mut events) = user_store(Arc::new(kv));

        store.save("alice", "KEY123").await.unwrap();
        events.drain();

        let err = store.save("bob", "KEY456").await.unwrap_err();
        assert!(matches!(err, AuthError::Persistence(_)));
        assert_eq!(store.current().await.unwrap().username, "alice");
        assert_eq!(notice_kinds(&mut events), vec![NoticeKind::Error]);
    }

    #[tokio::test]
    async fn test_load_missing_record() {
        let (store, _) = user_store(Arc::new(MemoryStore::default()));
        assert!(store.load().await.is_none());
        assert!(!store.has_saved_data().await);
    }

    #[tokio::test]
    async fn test_load_malformed_record_removes_it() {
        let kv = Arc::new(MemoryStore::default());
        kv.set(USER_DATA_KEY, r#"{"username":"alice"}"#).await.unwrap();
        let (store, _) = user_store(kv.clone());

        assert!(store.load().await.is_none());
        assert!(!kv.has_key(USER_DATA_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_load_read_failure_is_silent() {
        let mut kv = MockStore::new();
        kv.expect_get()
            .returning(|_| Err(BridgeError::NotAvailable("storage locked".into())));
        let (store, mut events) = user_store(Arc::new(kv));

        assert!(store.load().await.is_none());
        assert!(notice_kinds(&mut events).is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let kv = Arc::new(MemoryStore::default());
        let (store, _) = user_store(kv.clone());
        store.save("alice", "KEY123").await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.has_saved_data().await);
        assert!(!kv.has_key(USER_DATA_KEY).await.unwrap());
    }

    #[test]
    fn test_debug_redacts_activation_key() {
        let record = SavedCredentials {
            username: "alice".to_string(),
            activation_key: "KEY123".to_string(),
            is_saved: true,
            saved_at: Utc::now(),
        };

        let debug_str = format!("{:?}", record);
        assert!(debug_str.contains("alice"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("KEY123"));
    }
}
