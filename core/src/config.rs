//! Client configuration.
//!
//! The base URL and socket timeout are fixed for the lifetime of a
//! `RestClient`; there is no per-call override.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 15_000;

pub const ENV_BASE_URL: &str = "RESTKIK_BASE_URL";
pub const ENV_SOCKET_TIMEOUT_MS: &str = "RESTKIK_SOCKET_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix every method name is appended to.
    pub base_url: String,
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
}

fn default_socket_timeout_ms() -> u64 {
    DEFAULT_SOCKET_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            socket_timeout_ms: DEFAULT_SOCKET_TIMEOUT_MS,
        }
    }

    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    /// Load from `RESTKIK_*` environment variables. Only the base URL is
    /// required.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::Config(format!("{ENV_BASE_URL} is not set")))?;
        let mut config = Self::new(base_url);

        if let Some(raw) = lookup(ENV_SOCKET_TIMEOUT_MS) {
            config.socket_timeout_ms = raw.trim().parse().map_err(|e| {
                ApiError::Config(format!("invalid {ENV_SOCKET_TIMEOUT_MS} `{raw}`: {e}"))
            })?;
        }
        Ok(config)
    }
}
