//! Explicit configuration passed into the provider client and the workflows.
//!
//! Nothing in the library reads the environment; the CLI collects flags and
//! environment variables into these structs.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::providers::GpuProviderError;

/// Default Lambda Cloud API endpoint.
pub const DEFAULT_API_URL: &str = "https://cloud.lambdalabs.com/api/v1/";

/// Default timeout for a single API request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default pause between capacity polls while acquiring.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Default login user on provider images.
pub const DEFAULT_SSH_USER: &str = "ubuntu";

/// Connection settings for the provider API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Bearer credential.
    pub api_key: String,
    /// API root; relative paths are joined onto it.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Config pointing at the public API with default timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the API root (used against mock servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Check the config and return the normalised API root.
    ///
    /// # Errors
    /// Returns [`GpuProviderError::Config`] for an empty key or an unparseable URL.
    pub fn validate(&self) -> std::result::Result<reqwest::Url, GpuProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(GpuProviderError::Config(
                "API key is empty (set --api-key or LAMBDA_API_KEY)".to_string(),
            ));
        }

        // A trailing slash keeps `Url::join` from dropping the last segment.
        let mut base = self.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let url = reqwest::Url::parse(&base)
            .map_err(|e| GpuProviderError::Config(format!("invalid base URL {base}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(GpuProviderError::Config(format!(
                "base URL {base} cannot be used as an API root"
            )));
        }
        Ok(url)
    }
}

/// What every launch carries besides the offer itself.
#[derive(Debug, Clone, Default)]
pub struct LaunchConfig {
    /// SSH key names registered with the provider.
    pub ssh_key_names: Vec<String>,
    /// Optional name for launched instances.
    pub instance_name: Option<String>,
}

/// Acquisition loop settings.
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    /// Pause between polls.
    pub poll_interval: Duration,
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl AcquireConfig {
    /// Config polling every `poll_interval`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for a zero interval.
    pub fn new(poll_interval: Duration) -> Result<Self> {
        let config = Self { poll_interval };
        config.validate()?;
        Ok(config)
    }

    /// A zero interval would re-poll the provider back to back.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for a zero interval.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote shell settings.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Private key passed to `ssh -i`.
    pub key_path: Option<PathBuf>,
    /// Login user.
    pub user: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            key_path: None,
            user: DEFAULT_SSH_USER.to_string(),
        }
    }
}
