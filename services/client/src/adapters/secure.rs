//! services/client/src/adapters/secure.rs
//!
//! The secure credential store: a `KeyValueStore` over the OS key store
//! (Keychain, Credential Manager, Secret Service) via `keyring`. Each key is
//! one keyring entry under the client's service name.

use async_trait::async_trait;
use keyring::Entry;
use talent_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::debug;

pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> PortResult<Entry> {
        Entry::new(&self.service, key).map_err(|e| {
            PortError::Unexpected(format!("Failed to initialize keyring entry: {}", e))
        })
    }

    /// Keyring calls block on the platform backend.
    async fn blocking<T, F>(&self, key: &str, op: F) -> PortResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> PortResult<T> + Send + 'static,
    {
        let entry = self.entry(key)?;
        tokio::task::spawn_blocking(move || op(entry))
            .await
            .map_err(|e| PortError::Unexpected(format!("Keyring task failed: {}", e)))?
    }
}

fn keyring_error(action: &str, e: keyring::Error) -> PortError {
    PortError::Unexpected(format!("Failed to {} keyring secret: {}", action, e))
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.blocking(key, |entry| match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error("read", e)),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let value = value.to_string();
        self.blocking(key, move |entry| {
            entry
                .set_password(&value)
                .map_err(|e| keyring_error("store", e))
        })
        .await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let removed = self
            .blocking(key, |entry| match entry.delete_password() {
                Ok(()) => Ok(true),
                Err(keyring::Error::NoEntry) => Ok(false),
                Err(e) => Err(keyring_error("clear", e)),
            })
            .await?;
        if !removed {
            debug!(key, "No keyring entry to clear");
        }
        Ok(())
    }
}
