//! OAuth authorization

use crate::client::Mixcloud;
use crate::constants::{DEFAULT_TIMEOUT_SECS, OAUTH_ROOT};
use crate::error::{ClientError, OAuthError, Result};
use crate::urls::{url_join, with_query};
use serde_json::Value;
use std::time::Duration;

/// Produces authorization URLs and trades OAuth codes for access tokens
#[derive(Debug, Clone, Default)]
pub struct MixcloudOAuth {
    oauth_root: Option<String>,
    /// Client ID issued by Mixcloud
    pub client_id: Option<String>,
    /// Client secret issued by Mixcloud
    pub client_secret: Option<String>,
    /// Redirect URI chosen for the application
    pub redirect_uri: Option<String>,
    raise_exceptions: Option<bool>,
    client: Option<Mixcloud>,
}

impl MixcloudOAuth {
    /// OAuth helper against the default OAuth root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OAuth root. It takes precedence over an attached client's.
    pub fn with_oauth_root(mut self, oauth_root: impl Into<String>) -> Self {
        self.oauth_root = Some(oauth_root.into());
        self
    }

    /// Set the client ID.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the client secret.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set the redirect URI.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Fail on a rejected code instead of returning `None`.
    ///
    /// When unset, the policy of the attached client applies, and without
    /// a client rejected codes yield `None`.
    pub fn with_raise_exceptions(mut self, raise_exceptions: bool) -> Self {
        self.raise_exceptions = Some(raise_exceptions);
        self
    }

    /// Reuse the HTTP client, OAuth root and error policy of `client`.
    pub fn with_client(mut self, client: Mixcloud) -> Self {
        self.client = Some(client);
        self
    }

    /// OAuth root: the one set explicitly, else the attached client's,
    /// else the default.
    pub fn oauth_root(&self) -> &str {
        self.oauth_root
            .as_deref()
            .or_else(|| {
                self.client
                    .as_ref()
                    .map(|client| client.config().oauth_root.as_str())
            })
            .unwrap_or(OAUTH_ROOT)
    }

    fn check(&self) -> Result<(&str, &str)> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ClientError::precondition("client_id must be set"))?;
        let redirect_uri = self
            .redirect_uri
            .as_deref()
            .ok_or_else(|| ClientError::precondition("redirect_uri must be set"))?;
        Ok((client_id, redirect_uri))
    }

    fn should_raise(&self) -> bool {
        self.raise_exceptions
            .or_else(|| self.client.as_ref().map(Mixcloud::raise_exceptions))
            .unwrap_or(false)
    }

    /// URL to send the end user to for granting access.
    pub fn authorization_url(&self) -> Result<String> {
        let (client_id, redirect_uri) = self.check()?;
        let url = url_join(self.oauth_root(), "authorize")?;
        let url = with_query(url, &[("client_id", client_id), ("redirect_uri", redirect_uri)]);
        Ok(url.to_string())
    }

    /// Trade `code` for an access token.
    ///
    /// Returns `Ok(None)` when the server rejects the code and errors are
    /// not raised.
    pub async fn access_token(&self, code: &str) -> Result<Option<String>> {
        let (client_id, redirect_uri) = self.check()?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| ClientError::precondition("client_secret must be set"))?;

        let url = url_join(self.oauth_root(), "access_token")?;
        let url = with_query(
            url,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("client_secret", client_secret),
                ("code", code),
            ],
        );

        let http = match &self.client {
            Some(client) => client.inner.http.clone(),
            None => reqwest::Client::builder()
                .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                .build()?,
        };

        tracing::debug!(oauth_root = %self.oauth_root(), "exchanging OAuth code");
        let data: Value = http.get(url).send().await?.json().await?;

        match data.get("access_token") {
            Some(Value::String(token)) => Ok(Some(token.clone())),
            _ if self.should_raise() => Err(OAuthError::from_payload(&data).into()),
            _ => {
                tracing::debug!("OAuth code was rejected");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn query_pairs(url: &str) -> Vec<(String, String)> {
        url::Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[test]
    fn authorization_url_carries_id_and_redirect() {
        let oauth = MixcloudOAuth::new()
            .with_client_id("id")
            .with_redirect_uri("https://example.com/callback?x=1");
        let url = oauth.authorization_url().unwrap();

        assert!(url.starts_with("https://www.mixcloud.com/oauth/authorize?"));
        assert_eq!(
            query_pairs(&url),
            vec![
                ("client_id".to_string(), "id".to_string()),
                (
                    "redirect_uri".to_string(),
                    "https://example.com/callback?x=1".to_string()
                ),
            ]
        );
    }

    #[test]
    fn authorization_url_requires_settings() {
        let err = MixcloudOAuth::new().authorization_url().unwrap_err();
        assert_eq!(err.to_string(), "client_id must be set");

        let err = MixcloudOAuth::new()
            .with_client_id("id")
            .authorization_url()
            .unwrap_err();
        assert_eq!(err.to_string(), "redirect_uri must be set");
    }

    #[tokio::test]
    async fn access_token_requires_secret() {
        let oauth = MixcloudOAuth::new()
            .with_client_id("id")
            .with_redirect_uri("https://example.com");
        let err = oauth.access_token("code").await.unwrap_err();
        assert_eq!(err.to_string(), "client_secret must be set");
    }

    #[test]
    fn error_policy_falls_back_to_client() {
        assert!(!MixcloudOAuth::new().should_raise());

        let raising = Mixcloud::new(ClientConfig::default().with_raise_exceptions(true)).unwrap();
        let oauth = MixcloudOAuth::new().with_client(raising);
        assert!(oauth.should_raise());
        assert!(!oauth.with_raise_exceptions(false).should_raise());
    }

    #[test]
    fn oauth_root_follows_the_client_unless_set() {
        let client = Mixcloud::new(
            ClientConfig::default().with_oauth_root("http://localhost:9999/oauth"),
        )
        .unwrap();

        let oauth = MixcloudOAuth::new()
            .with_client_id("id")
            .with_redirect_uri("https://example.com")
            .with_client(client);
        assert_eq!(oauth.oauth_root(), "http://localhost:9999/oauth");
        assert!(oauth
            .authorization_url()
            .unwrap()
            .starts_with("http://localhost:9999/oauth/authorize?"));

        let explicit = oauth.with_oauth_root("https://auth.example.com");
        assert_eq!(explicit.oauth_root(), "https://auth.example.com");
        assert_eq!(MixcloudOAuth::new().oauth_root(), OAUTH_ROOT);
    }
}
