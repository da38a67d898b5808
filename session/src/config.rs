//! Client configuration parsed from environment variables.

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_TOKEN_KEY: &str = "formbase_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API origin without a trailing slash, e.g. `https://api.example.com`.
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Storage key the token is persisted under.
    pub token_key: String,
    /// Merge `/api/user/me` into the user fetched from `/api/auth/me`.
    pub merge_profile: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            token_key: DEFAULT_TOKEN_KEY.to_owned(),
            merge_profile: true,
        }
    }
}

impl ClientConfig {
    /// Config with defaults for everything but the API origin.
    #[must_use]
    pub fn with_base_url(base_url: &str) -> Self {
        Self { base_url: normalize_base_url(base_url), ..Self::default() }
    }

    /// Build typed client config from environment variables.
    ///
    /// All optional:
    /// - `FORMBASE_API_URL`: default `http://localhost:3001`
    /// - `FORMBASE_REQUEST_TIMEOUT_SECS`: default 10
    /// - `FORMBASE_CONNECT_TIMEOUT_SECS`: default 5
    /// - `FORMBASE_TOKEN_KEY`: default `formbase_token`
    /// - `FORMBASE_MERGE_PROFILE`: `true` (default) or `false`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("FORMBASE_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
        let request_timeout_secs =
            env_parse_u64("FORMBASE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let connect_timeout_secs =
            env_parse_u64("FORMBASE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let token_key = std::env::var("FORMBASE_TOKEN_KEY").unwrap_or_else(|_| DEFAULT_TOKEN_KEY.to_owned());
        let merge_profile = parse_bool("FORMBASE_MERGE_PROFILE", std::env::var("FORMBASE_MERGE_PROFILE").ok().as_deref())?;

        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "FORMBASE_REQUEST_TIMEOUT_SECS",
                value: "0".to_owned(),
            });
        }

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            request_timeout_secs,
            connect_timeout_secs,
            token_key,
            merge_profile,
        })
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None => Ok(true),
        Some("1" | "true" | "yes") => Ok(true),
        Some("0" | "false" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid { var, value: other.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
