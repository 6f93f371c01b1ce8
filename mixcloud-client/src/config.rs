//! Client configuration

use crate::constants::{
    API_ROOT, DEFAULT_TIMEOUT_SECS, DESCRIPTION_MAX_SIZE, ENV_ACCESS_TOKEN, ENV_API_ROOT,
    ENV_RAISE_EXCEPTIONS, MIXCLOUD_ROOT, MP3_MAX_SIZE, OAUTH_ROOT, OEMBED_ROOT, PICTURE_MAX_SIZE,
    TAG_MAX_COUNT,
};
use crate::error::{ClientError, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Size and count limits enforced before uploading
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// Maximum mp3 size in bytes (default: 4 GiB)
    pub max_mp3_bytes: u64,
    /// Maximum picture size in bytes (default: 10 MiB)
    pub max_picture_bytes: u64,
    /// Maximum description length in characters (default: 1,000)
    pub max_description_chars: usize,
    /// Maximum number of tags (default: 5)
    pub max_tags: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_mp3_bytes: MP3_MAX_SIZE,
            max_picture_bytes: PICTURE_MAX_SIZE,
            max_description_chars: DESCRIPTION_MAX_SIZE,
            max_tags: TAG_MAX_COUNT,
        }
    }
}

/// Configuration of a [`Mixcloud`](crate::Mixcloud) client
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for all API requests
    pub api_root: String,
    /// Base Mixcloud URL, used to build oEmbed resource URLs
    pub mixcloud_root: String,
    /// Base URL for oEmbed requests
    pub oembed_root: String,
    /// Base URL for OAuth requests
    pub oauth_root: String,
    /// OAuth access token for personal operations
    pub access_token: Option<String>,
    /// Fail on API error payloads instead of returning them as mappings
    pub raise_exceptions: bool,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upload limits
    pub limits: UploadLimits,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: API_ROOT.to_string(),
            mixcloud_root: MIXCLOUD_ROOT.to_string(),
            oembed_root: OEMBED_ROOT.to_string(),
            oauth_root: OAUTH_ROOT.to_string(),
            access_token: None,
            raise_exceptions: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            limits: UploadLimits::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `MIXCLOUD_ACCESS_TOKEN`, `MIXCLOUD_API_ROOT`
    /// and `MIXCLOUD_RAISE_EXCEPTIONS`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable lookup.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|token| !token.is_empty()) {
            self.access_token = Some(token);
        }
        if let Some(root) = lookup(ENV_API_ROOT).filter(|root| !root.is_empty()) {
            self.api_root = root;
        }
        if let Some(flag) = lookup(ENV_RAISE_EXCEPTIONS) {
            self.raise_exceptions = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        self
    }

    /// Set the API root.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Set the Mixcloud root.
    pub fn with_mixcloud_root(mut self, mixcloud_root: impl Into<String>) -> Self {
        self.mixcloud_root = mixcloud_root.into();
        self
    }

    /// Set the oEmbed root.
    pub fn with_oembed_root(mut self, oembed_root: impl Into<String>) -> Self {
        self.oembed_root = oembed_root.into();
        self
    }

    /// Set the OAuth root.
    pub fn with_oauth_root(mut self, oauth_root: impl Into<String>) -> Self {
        self.oauth_root = oauth_root.into();
        self
    }

    /// Set the access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Set the error policy.
    pub fn with_raise_exceptions(mut self, raise_exceptions: bool) -> Self {
        self.raise_exceptions = raise_exceptions;
        self
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that every root is an absolute URL and the timeout is non-zero.
    pub fn validate(&self) -> Result<()> {
        for root in [
            &self.api_root,
            &self.mixcloud_root,
            &self.oembed_root,
            &self.oauth_root,
        ] {
            Url::parse(root)?;
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::precondition("timeout must be at least one second"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_mixcloud() {
        let config = ClientConfig::default();
        assert_eq!(config.api_root, "https://api.mixcloud.com");
        assert_eq!(config.oembed_root, "https://www.mixcloud.com/oembed");
        assert!(!config.raise_exceptions);
        assert_eq!(config.limits.max_tags, 5);
        assert_eq!(config.limits.max_mp3_bytes, 4_294_967_296);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MIXCLOUD_ACCESS_TOKEN", "secret"),
            ("MIXCLOUD_API_ROOT", "http://localhost:9000"),
            ("MIXCLOUD_RAISE_EXCEPTIONS", "True"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::default()
            .with_env_overrides(|name| vars.get(name).map(|value| value.to_string()));

        assert_eq!(config.access_token.as_deref(), Some("secret"));
        assert_eq!(config.api_root, "http://localhost:9000");
        assert!(config.raise_exceptions);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let config = ClientConfig::default().with_env_overrides(|_| Some(String::new()));
        assert_eq!(config.access_token, None);
        assert_eq!(config.api_root, "https://api.mixcloud.com");
        assert!(!config.raise_exceptions);
    }

    #[test]
    fn validation_rejects_relative_roots_and_zero_timeout() {
        let config = ClientConfig::default().with_api_root("api.mixcloud.com");
        assert!(matches!(config.validate(), Err(ClientError::Url(_))));

        let config = ClientConfig::default().with_timeout_secs(0);
        assert!(matches!(config.validate(), Err(ClientError::Precondition(_))));
    }

    #[test]
    fn deserializes_partial_tables() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"access_token": "t", "limits": {"max_tags": 3}}"#).unwrap();
        assert_eq!(config.access_token.as_deref(), Some("t"));
        assert_eq!(config.limits.max_tags, 3);
        assert_eq!(config.limits.max_description_chars, 1_000);
        assert_eq!(config.api_root, "https://api.mixcloud.com");
    }
}
