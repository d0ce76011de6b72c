//! Client configuration, read from `STOREMAP_*` environment variables.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is undefined.")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// How long each kind of toast stays up. Loading toasts stay until resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToastConfig {
    /// The confirmation shown after creating a storefront
    pub created: Duration,
    pub success: Duration,
    pub error: Duration,
}

impl Default for ToastConfig {
    fn default() -> Self { Self { created: Duration::from_secs(5), success: Duration::from_secs(2), error: Duration::from_secs(4) } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub database_url: String,
    pub pool_size: u32,
    /// Role assumed for every statement so row-level policies apply
    pub session_role: Option<String>,
    /// Prefix for static assets such as map tiles
    pub base_url: String,
    pub toasts: ToastConfig,
}

impl ClientConfig {
    pub const DATABASE_URL: &'static str = "STOREMAP_DATABASE_URL";
    pub const POOL_SIZE: &'static str = "STOREMAP_POOL_SIZE";
    pub const SESSION_ROLE: &'static str = "STOREMAP_SESSION_ROLE";
    pub const BASE_URL: &'static str = "STOREMAP_BASE_URL";

    pub const DEFAULT_POOL_SIZE: u32 = 4;

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool_size: Self::DEFAULT_POOL_SIZE,
            session_role: None,
            base_url: "/".to_owned(),
            toasts: ToastConfig::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|name| std::env::var(name).ok()) }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let mut config = Self::new(get(Self::DATABASE_URL).ok_or(ConfigError::Missing(Self::DATABASE_URL))?);
        if let Some(size) = get(Self::POOL_SIZE) {
            config.pool_size = match size.parse::<u32>() {
                Ok(0) => return Err(ConfigError::Invalid { name: Self::POOL_SIZE, reason: "must be at least 1".into() }),
                Ok(size) => size,
                Err(err) => return Err(ConfigError::Invalid { name: Self::POOL_SIZE, reason: err.to_string() }),
            };
        }
        config.session_role = get(Self::SESSION_ROLE);
        if let Some(base_url) = get(Self::BASE_URL) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}
