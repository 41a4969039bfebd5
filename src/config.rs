//! # Configuration
//!
//! The signer needs a single value from its host: the base URL of the key
//! management service.

use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the KMS base URL.
pub const KMS_BASE_URL: &str = "KMS_BASE_URL";

/// Signer configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    base_url: Url,
}

impl Config {
    /// Create a configuration for the KMS at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the URL is empty, cannot be parsed
    /// or cannot be used as a base for the KMS endpoints.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let base_url = base_url.as_ref().trim();
        if base_url.is_empty() {
            return Err(Error::Configuration(format!("{KMS_BASE_URL} not set")));
        }
        let url = Url::parse(base_url)
            .map_err(|e| Error::Configuration(format!("invalid {KMS_BASE_URL} {base_url}: {e}")))?;
        if url.cannot_be_a_base() {
            return Err(Error::Configuration(format!("{KMS_BASE_URL} {base_url} is not a base URL")));
        }
        Ok(Self { base_url: url })
    }

    /// Load configuration from the `KMS_BASE_URL` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the variable is not set or holds an
    /// invalid URL.
    pub fn from_env() -> Result<Self> {
        let Ok(base_url) = std::env::var(KMS_BASE_URL) else {
            tracing::error!("{KMS_BASE_URL} not set");
            return Err(Error::Configuration(format!("{KMS_BASE_URL} not set")));
        };
        Self::new(base_url)
    }

    /// The KMS base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_url() {
        let config = Config::new("https://kms.example").expect("should parse");
        assert_eq!(config.base_url().as_str(), "https://kms.example/");
    }

    #[test]
    fn empty_url() {
        let err = Config::new("  ").expect_err("should fail");
        assert_eq!(err, Error::Configuration("KMS_BASE_URL not set".to_string()));
    }

    #[test]
    fn not_a_base() {
        let err = Config::new("mailto:kms@example.com").expect_err("should fail");
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn unparseable() {
        let err = Config::new("kms.example").expect_err("should fail");
        assert!(matches!(err, Error::Configuration(_)));
    }
}
