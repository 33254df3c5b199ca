//! API configuration parsed from environment variables.

use crate::grid::PAGE_SIZES;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },

    #[error("env var {var} has invalid value '{value}'")]
    Parse { var: &'static str, value: String },

    #[error("page size {0} is not one of {sizes:?}", sizes = PAGE_SIZES)]
    PageSize(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ApiTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Service root without a trailing slash, e.g. `http://localhost:3000`.
    pub base_url: String,
    pub timeouts: ApiTimeouts,
    /// Initial grid page size.
    pub page_size: usize,
}

impl ApiConfig {
    /// Config with default timeouts and page size.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeouts: ApiTimeouts::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Build typed config from environment variables.
    ///
    /// Required:
    /// - `LEDGER_API_BASE_URL`
    ///
    /// Optional:
    /// - `LEDGER_API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `LEDGER_API_CONNECT_TIMEOUT_SECS`: default 10
    /// - `LEDGER_PAGE_SIZE`: default 10, one of 10, 20, 30, 40, 50
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the base URL is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the base URL is missing or a value does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("LEDGER_API_BASE_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing { var: "LEDGER_API_BASE_URL" })?;

        let timeouts = ApiTimeouts {
            request_secs: parse_or(&lookup, "LEDGER_API_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_or(&lookup, "LEDGER_API_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        let page_size = parse_or(&lookup, "LEDGER_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !PAGE_SIZES.contains(&page_size) {
            return Err(ConfigError::PageSize(page_size));
        }

        Ok(Self { timeouts, page_size, ..Self::new(base_url) })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Parse { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
