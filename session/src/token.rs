//! Bearer-token persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Exactly one token is persisted per API origin. Only the session
//! controller writes it; the HTTP client reads it for every request. No
//! expiry is tracked locally: the server rejecting a request is the only
//! expiry signal.

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::sync::Mutex;

/// A durable slot for a single bearer token.
pub trait TokenStore: Send + Sync {
    /// Currently persisted token, if any.
    fn get_token(&self) -> Option<String>;

    /// Store `value`, or clear the slot when `None`. No shape validation.
    fn set_token(&self, value: Option<&str>);

    fn clear_token(&self) {
        self.set_token(None);
    }
}

/// Process-lifetime store; used by tests and one-shot tools.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self { slot: Mutex::new(Some(token.to_owned())) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn set_token(&self, value: Option<&str>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = value.map(str::to_owned);
        }
    }
}

/// Reduce a URL to `scheme://host[:port]`, lowercased.
///
/// Tokens are scoped by this key so one store can serve several API origins.
#[must_use]
pub fn origin_of(url: &str) -> String {
    let url = url.trim();
    let (scheme, rest) = url.split_once("://").unwrap_or(("http", url));
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    format!("{}://{}", scheme.to_ascii_lowercase(), host.to_ascii_lowercase())
}

#[cfg(feature = "native")]
pub use file::FileTokenStore;

#[cfg(feature = "native")]
mod file {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use serde::{Deserialize, Serialize};

    use super::{TokenStore, origin_of};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct TokenFile {
        #[serde(default)]
        tokens: BTreeMap<String, String>,
    }

    /// JSON file holding one token per API origin.
    ///
    /// A missing or unreadable file reads as "no token"; write failures are
    /// logged and otherwise ignored so a broken disk never crashes a flow.
    #[derive(Debug)]
    pub struct FileTokenStore {
        path: PathBuf,
        origin: String,
        io: Mutex<()>,
    }

    impl FileTokenStore {
        #[must_use]
        pub fn new(path: impl Into<PathBuf>, base_url: &str) -> Self {
            Self { path: path.into(), origin: origin_of(base_url), io: Mutex::new(()) }
        }

        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_file(&self) -> TokenFile {
            let raw = match std::fs::read_to_string(&self.path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return TokenFile::default(),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "token file unreadable");
                    return TokenFile::default();
                }
            };
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "token file corrupt; ignoring");
                TokenFile::default()
            })
        }

        fn write_file(&self, file: &TokenFile) {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        tracing::warn!(path = %parent.display(), error = %e, "token dir create failed");
                        return;
                    }
                }
            }
            let raw = match serde_json::to_string_pretty(file) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!(error = %e, "token file encode failed");
                    return;
                }
            };
            if let Err(e) = std::fs::write(&self.path, raw) {
                tracing::warn!(path = %self.path.display(), error = %e, "token file write failed");
            }
        }
    }

    impl TokenStore for FileTokenStore {
        fn get_token(&self) -> Option<String> {
            let _io = self.io.lock().ok()?;
            self.read_file().tokens.get(&self.origin).cloned()
        }

        fn set_token(&self, value: Option<&str>) {
            let Ok(_io) = self.io.lock() else {
                return;
            };
            let mut file = self.read_file();
            match value {
                Some(token) => {
                    file.tokens.insert(self.origin.clone(), token.to_owned());
                }
                None => {
                    if file.tokens.remove(&self.origin).is_none() {
                        return;
                    }
                }
            }
            self.write_file(&file);
        }
    }
}
