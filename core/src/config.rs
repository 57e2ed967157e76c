//! Client configuration.
//!
//! The base URL is an ordinary value handed to `PinboardClient`, so tests
//! point a client at a local mock server without touching global state.

use log::debug;

/// Production endpoint of the v1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.pinboard.in/v1";

/// Environment variable that overrides the base URL in `from_env`.
pub const BASE_URL_ENV: &str = "PINBOARD_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the base URL from `PINBOARD_BASE_URL`, falling back to the
    /// production endpoint when unset or blank.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => {
                debug!("using base URL from {BASE_URL_ENV}");
                Self::new(url.trim())
            }
            _ => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
