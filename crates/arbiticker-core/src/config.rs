//! Configuration for the coordinator and its backend client

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Name used when a profile is created with a blank name
pub const DEFAULT_PROFILE_NAME: &str = "My profile";

/// Configuration for coordinator operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Base URL of the analysis backend
    pub api_base: String,

    /// Request timeout; multi-agent analyses are slow
    pub request_timeout: Duration,

    /// Name substituted for blank profile names
    pub default_profile_name: String,

    /// How long success notices stay visible
    pub notice_ttl: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(180),
            default_profile_name: DEFAULT_PROFILE_NAME.to_string(),
            notice_ttl: Duration::from_secs(3),
        }
    }
}

impl CoordinatorConfig {
    /// Create a new configuration builder
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::default()
    }

    /// Load from `ARBITICKER_API_BASE` / `ARBITICKER_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env().build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if self.default_profile_name.trim().is_empty() {
            return Err(Error::Config(
                "default_profile_name must not be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed base URL, always ending in `/` so relative joins keep any path prefix
    pub fn base_url(&self) -> Result<Url> {
        let mut base = self.api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Url::parse(&base).map_err(|e| Error::Config(format!("invalid api_base {:?}: {e}", self.api_base)))
    }
}

/// Builder for CoordinatorConfig
#[derive(Debug, Default)]
pub struct CoordinatorConfigBuilder {
    api_base: Option<String>,
    request_timeout: Option<Duration>,
    default_profile_name: Option<String>,
    notice_ttl: Option<Duration>,
    env_error: Option<String>,
}

impl CoordinatorConfigBuilder {
    /// Set the backend base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the fallback profile name
    pub fn default_profile_name(mut self, name: impl Into<String>) -> Self {
        self.default_profile_name = Some(name.into());
        self
    }

    /// Set how long success notices stay visible
    pub fn notice_ttl(mut self, duration: Duration) -> Self {
        self.notice_ttl = Some(duration);
        self
    }

    /// Read overrides from the process environment
    pub fn with_env(self) -> Self {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through an arbitrary lookup
    pub fn with_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup("ARBITICKER_API_BASE") {
            self.api_base = Some(base);
        }
        if let Some(secs) = lookup("ARBITICKER_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(secs) => self.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => {
                    self.env_error = Some(format!("ARBITICKER_TIMEOUT_SECS is not a number: {secs}"));
                }
            }
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CoordinatorConfig> {
        if let Some(err) = self.env_error {
            return Err(Error::Config(err));
        }

        let defaults = CoordinatorConfig::default();
        let config = CoordinatorConfig {
            api_base: self.api_base.unwrap_or(defaults.api_base),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            default_profile_name: self
                .default_profile_name
                .unwrap_or(defaults.default_profile_name),
            notice_ttl: self.notice_ttl.unwrap_or(defaults.notice_ttl),
        };

        config.validate()?;
        Ok(config)
    }
}
