//! Configuration module
//!
//! Client configuration is read from `VISIONCRAFT_*` environment variables
//! (optionally through a `.env` file). Every field has a default so an empty
//! environment yields a client pointed at a local development server.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

const ENV_PREFIX: &str = "VISIONCRAFT_";
const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("visioncraft/{}", env!("CARGO_PKG_VERSION"))
}

/// Where and how the client talks to the transformation service.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin of the service, e.g. `http://localhost:5000` (VISIONCRAFT_BASE_URL)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path prefix in front of every endpoint (VISIONCRAFT_API_PREFIX)
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Transport timeout for a single request (VISIONCRAFT_TIMEOUT_SECS)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> ClientResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<ClientConfig>()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Same as `from_env` but reads from an explicit list of variables.
    pub fn from_vars<I>(vars: I) -> ClientResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, ClientConfig>(vars)
            .map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> ClientResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ClientError::Config("base_url must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base_url must start with http:// or https://, got {}",
                base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }

    /// API prefix with exactly one leading slash and no trailing slash; empty stays empty.
    pub fn normalized_api_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_from_empty_environment() {
        let config = ClientConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn reads_prefixed_variables() {
        let config = ClientConfig::from_vars(vars(&[
            ("VISIONCRAFT_BASE_URL", "https://images.example.com/"),
            ("VISIONCRAFT_API_PREFIX", "v2/"),
            ("VISIONCRAFT_TIMEOUT_SECS", "5"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.normalized_base_url(), "https://images.example.com");
        assert_eq!(config.normalized_api_prefix(), "/v2");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = ClientConfig::from_vars(vars(&[("VISIONCRAFT_BASE_URL", "ftp://host")]))
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err =
            ClientConfig::from_vars(vars(&[("VISIONCRAFT_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn rejects_unparsable_timeout() {
        let err =
            ClientConfig::from_vars(vars(&[("VISIONCRAFT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn empty_prefix_stays_empty() {
        let config = ClientConfig {
            api_prefix: "/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(config.normalized_api_prefix(), "");
    }
}
