//! `localStorage`-backed bearer-token slot.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session controller is the only writer. Storage failures (private
//! mode, quota, no window) degrade to "no token" and are logged, never
//! surfaced.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use session::TokenStore;

/// Token store persisting under a fixed `localStorage` key.
#[derive(Clone, Debug)]
pub struct LocalStorageTokenStore {
    key: String,
}

impl LocalStorageTokenStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(feature = "csr")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl TokenStore for LocalStorageTokenStore {
    fn get_token(&self) -> Option<String> {
        #[cfg(feature = "csr")]
        {
            local_storage()?.get_item(&self.key).ok().flatten().filter(|token| !token.is_empty())
        }
        #[cfg(not(feature = "csr"))]
        {
            None
        }
    }

    fn set_token(&self, value: Option<&str>) {
        #[cfg(feature = "csr")]
        {
            let Some(storage) = local_storage() else {
                log::warn!("localStorage unavailable; token not persisted");
                return;
            };
            let result = match value {
                Some(token) => storage.set_item(&self.key, token),
                None => storage.remove_item(&self.key),
            };
            if result.is_err() {
                log::warn!("localStorage write failed for key {}", self.key);
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = value;
        }
    }
}
