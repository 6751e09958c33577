//! Configuration for the ConvertAPI client.
//!
//! All service settings live in [`ServiceConfig`], built via its
//! [`ServiceConfigBuilder`] or loaded with [`ServiceConfig::from_env`].

use crate::error::ConvertError;
use std::fmt;

/// Default ConvertAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://v2.convertapi.com";

/// Environment variable holding the API secret.
pub const SECRET_ENV: &str = "CONVERT_API_SECRET";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "CONVERT_API_BASE_URL";

/// Settings for talking to the remote conversion service.
///
/// # Example
/// ```rust
/// use fileconvert::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .secret("my-secret")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, Some(90));
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// API secret sent as a bearer token.
    pub secret: String,

    /// Service root, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Per-conversion timeout in seconds. Default: `None` (wait for the
    /// service however long it takes).
    pub api_timeout_secs: Option<u64>,

    /// Timeout for downloading URL inputs and converted artifacts, in
    /// seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_timeout_secs: None,
            download_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load the secret from `CONVERT_API_SECRET` and the optional base URL
    /// from `CONVERT_API_BASE_URL`.
    pub fn from_env() -> Result<Self, ConvertError> {
        let mut builder = Self::builder();
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            builder = builder.secret(secret);
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }

    /// Full URL of the convert endpoint for a pair of lowercase tags.
    pub fn convert_url(&self, source_tag: &str, target_tag: &str) -> String {
        format!("{}/convert/{}/to/{}", self.base_url, source_tag, target_tag)
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.config.secret = secret.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ConvertError> {
        let c = &self.config;
        if c.secret.trim().is_empty() {
            return Err(ConvertError::MissingSecret);
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ConvertError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.download_timeout_secs == 0 {
            return Err(ConvertError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ServiceConfig::builder().secret("s").build().unwrap();
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.api_timeout_secs, None);
        assert_eq!(c.download_timeout_secs, 120);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = ServiceConfig::builder().build().unwrap_err();
        assert!(matches!(err, ConvertError::MissingSecret));
        let err = ServiceConfig::builder().secret("   ").build().unwrap_err();
        assert!(matches!(err, ConvertError::MissingSecret));
    }

    #[test]
    fn base_url_is_validated_and_trimmed() {
        let c = ServiceConfig::builder()
            .secret("s")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(c.base_url, "http://localhost:8080");
        assert_eq!(
            c.convert_url("dwg", "pdf"),
            "http://localhost:8080/convert/dwg/to/pdf"
        );

        let err = ServiceConfig::builder()
            .secret("s")
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidConfig(_)));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        assert!(ServiceConfig::builder()
            .secret("s")
            .api_timeout_secs(0)
            .build()
            .is_err());
        assert!(ServiceConfig::builder()
            .secret("s")
            .download_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let c = ServiceConfig::builder().secret("top-secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
