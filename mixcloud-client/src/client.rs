//! The Mixcloud client context
//!
//! [`Mixcloud`] is a cheap, cloneable handle over the shared client state.
//! Every wrapper it returns points back at that state through a
//! [`ContextHandle`], so entities and collections can load themselves,
//! follow connections and page through results without owning the
//! client.

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, Result};
use crate::operations::{ClientOperation, TargetedAction};
use crate::urls::{redacted, update_query, url_join};
use async_trait::async_trait;
use mixcloud_model::{
    classify, ClientContext, ContextHandle, Entity, EntityCollection, KeyedMapping, ModelError,
    OperationRegistry, Pagination, Wrapped,
};
use mixcloud_model::constants::DATA_FIELD;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use url::Url;

/// Options for [`Mixcloud::get`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetOptions {
    /// Resolve the URL against the API root (default: true)
    pub relative: bool,
    /// Synthesize connections on a returned entity (default: true)
    pub create_connections: bool,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            relative: true,
            create_connections: true,
        }
    }
}

impl GetOptions {
    /// Options for an absolute URL.
    pub fn absolute() -> Self {
        Self {
            relative: false,
            ..Self::default()
        }
    }

    /// Set whether connections are synthesized.
    pub fn with_create_connections(mut self, create_connections: bool) -> Self {
        self.create_connections = create_connections;
        self
    }
}

/// Kind of resource searched by [`Mixcloud::search`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchType {
    /// Cloudcasts (default)
    #[default]
    Cloudcast,
    /// Users
    User,
    /// Tags
    Tag,
}

impl SearchType {
    /// Value sent as the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Cloudcast => "cloudcast",
            SearchType::User => "user",
            SearchType::Tag => "tag",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cloudcast" => Ok(SearchType::Cloudcast),
            "user" => Ok(SearchType::User),
            "tag" => Ok(SearchType::Tag),
            other => Err(ClientError::precondition(format!(
                "unknown search type {:?}, expected cloudcast, user or tag",
                other
            ))),
        }
    }
}

/// Shared client state; the [`ClientContext`] behind every wrapper
pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    access_token: RwLock<Option<String>>,
    pub(crate) http: reqwest::Client,
    operations: OperationRegistry,
    handle: ContextHandle,
}

impl ClientInner {
    pub(crate) fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Token for personal operations.
    pub(crate) fn require_token(&self) -> Result<String> {
        self.access_token()
            .ok_or_else(|| ClientError::precondition("access_token must be set"))
    }

    pub(crate) fn raise_exceptions(&self) -> bool {
        self.config.raise_exceptions
    }

    pub(crate) fn handle(&self) -> &ContextHandle {
        &self.handle
    }

    /// API root followed by `segment`.
    pub(crate) fn build_url(&self, segment: &str) -> Result<Url> {
        url_join(&self.config.api_root, segment)
    }

    fn empty_mapping(&self) -> Wrapped {
        Wrapped::Mapping(KeyedMapping::new(Map::new(), self.handle.clone()))
    }

    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = request.build()?;
        tracing::debug!(
            method = %request.method(),
            url = %redacted(request.url()),
            "sending request"
        );
        let response = self.http.execute(request).await?;
        tracing::debug!(status = %response.status(), "received response");
        Ok(response)
    }

    /// Decode a JSON body without checking its content type.
    ///
    /// `Ok(None)` means the body was not JSON and errors are not raised.
    async fn decode(&self, response: reqwest::Response) -> Result<Option<Value>> {
        let body = response.bytes().await?;
        match serde_json::from_slice(&body) {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.raise_exceptions() => Err(err.into()),
            Err(err) => {
                tracing::warn!(error = %err, "could not decode response body");
                Ok(None)
            }
        }
    }

    pub(crate) async fn get(
        &self,
        url: &str,
        options: GetOptions,
        params: &[(String, String)],
    ) -> Result<Wrapped> {
        let mut url = if options.relative {
            self.build_url(url)?
        } else {
            Url::parse(url)?
        };

        let mut query: Vec<(String, String)> = params.to_vec();
        query.push(("metadata".to_string(), "1".to_string()));
        if let Some(token) = self.access_token() {
            query.push(("access_token".to_string(), token));
        }
        update_query(&mut url, &query);

        let response = self.send(self.http.get(url)).await?;
        let Some(data) = self.decode(response).await? else {
            return Ok(self.empty_mapping());
        };

        let map = match data {
            Value::Object(map) => map,
            other => return Ok(classify(other, &self.handle)),
        };

        if map.contains_key("error") {
            if self.raise_exceptions() {
                return Err(ApiError::from_payload(&map).into());
            }
            return Ok(Wrapped::Mapping(KeyedMapping::new(map, self.handle.clone())));
        }
        if matches!(map.get(DATA_FIELD), Some(Value::Array(_))) {
            let collection = EntityCollection::new(map, self.handle.clone())?;
            return Ok(Wrapped::Collection(collection));
        }
        Ok(Wrapped::Entity(Entity::new(
            map,
            self.handle.clone(),
            true,
            options.create_connections,
        )))
    }

    /// Decoded response as a mapping, honoring the error policy.
    pub(crate) async fn native_result(&self, response: reqwest::Response) -> Result<Wrapped> {
        let Some(data) = self.decode(response).await? else {
            return Ok(self.empty_mapping());
        };
        match data {
            Value::Object(map) => {
                if map.contains_key("error") && self.raise_exceptions() {
                    return Err(ApiError::from_payload(&map).into());
                }
                Ok(Wrapped::Mapping(KeyedMapping::new(map, self.handle.clone())))
            }
            other => Ok(classify(other, &self.handle)),
        }
    }

    /// JSON-ish responses as a mapping, anything else as a string scalar.
    pub(crate) async fn proper_result(&self, response: reqwest::Response) -> Result<Wrapped> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("javascript") || content_type.contains("json") {
            return self.native_result(response).await;
        }
        Ok(Wrapped::Scalar(Value::String(response.text().await?)))
    }
}

#[async_trait]
impl ClientContext for ClientInner {
    async fn fetch_by_key(
        &self,
        key: &str,
        create_connections: bool,
    ) -> mixcloud_model::Result<Wrapped> {
        let options = GetOptions::default().with_create_connections(create_connections);
        self.get(key, options, &[]).await.map_err(ModelError::from)
    }

    async fn fetch_absolute(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> mixcloud_model::Result<Wrapped> {
        self.get(url, GetOptions::absolute(), params)
            .await
            .map_err(ModelError::from)
    }

    fn operations(&self) -> &OperationRegistry {
        &self.operations
    }
}

/// Asynchronous Mixcloud API client
///
/// Cloning is cheap and every clone shares the same HTTP connection pool,
/// access token and operation registry. Wrappers returned by the client
/// stay navigable for as long as at least one clone is alive.
#[derive(Clone)]
pub struct Mixcloud {
    pub(crate) inner: Arc<ClientInner>,
}

impl Mixcloud {
    /// Create a client with its own HTTP connection pool.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Self::with_http_client(config, http)
    }

    /// Create a client on top of an existing HTTP client.
    pub fn with_http_client(config: ClientConfig, http: reqwest::Client) -> Result<Self> {
        config.validate()?;

        let access_token = config.access_token.clone();
        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| ClientInner {
            config,
            access_token: RwLock::new(access_token),
            http,
            operations: OperationRegistry::new(),
            handle: ContextHandle::from_weak(weak.clone()),
        });

        for action in TargetedAction::ALL {
            let operation = ClientOperation::new(action, Arc::downgrade(&inner));
            inner.operations.register(Arc::new(operation))?;
        }

        Ok(Self { inner })
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Current access token.
    pub fn access_token(&self) -> Option<String> {
        self.inner.access_token()
    }

    /// Replace the access token used by every clone of this client.
    pub fn set_access_token(&self, token: Option<String>) {
        self.inner.set_access_token(token);
    }

    /// Whether API error payloads become errors.
    pub fn raise_exceptions(&self) -> bool {
        self.inner.raise_exceptions()
    }

    /// Handle that wrappers use to reach this client.
    pub fn handle(&self) -> ContextHandle {
        self.inner.handle().clone()
    }

    /// Registered targeted operations.
    pub fn operations(&self) -> &OperationRegistry {
        &self.inner.operations
    }

    /// GET `url` and wrap the decoded response.
    ///
    /// `metadata=1` and the access token (if any) are added to the query,
    /// replacing any values already present. The result is an
    /// [`EntityCollection`] for page envelopes, a full [`Entity`] for
    /// single resources, and a [`KeyedMapping`] for error payloads or
    /// bodies that are not JSON (unless the client raises exceptions).
    pub async fn get(
        &self,
        url: &str,
        options: GetOptions,
        params: &[(String, String)],
    ) -> Result<Wrapped> {
        self.inner.get(url, options, params).await
    }

    /// The user authorized by the access token.
    pub async fn me(&self) -> Result<Wrapped> {
        self.inner.require_token()?;
        self.get("me", GetOptions::default(), &[]).await
    }

    /// Information about `tag`.
    pub async fn discover(&self, tag: &str) -> Result<Wrapped> {
        self.get(&format!("discover/{}", tag), GetOptions::default(), &[])
            .await
    }

    /// Popular cloudcasts.
    pub async fn popular(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.paginated("popular", pagination, Vec::new()).await
    }

    /// Hot cloudcasts.
    pub async fn hot(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.paginated("popular/hot", pagination, Vec::new()).await
    }

    /// New cloudcasts.
    pub async fn new_cloudcasts(&self, pagination: &Pagination) -> Result<Wrapped> {
        self.paginated("new", pagination, Vec::new()).await
    }

    /// Search resources of `search_type` matching `query`.
    pub async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        pagination: &Pagination,
    ) -> Result<Wrapped> {
        let params = vec![
            ("q".to_string(), query.to_string()),
            ("type".to_string(), search_type.as_str().to_string()),
        ];
        self.paginated("search", pagination, params).await
    }

    async fn paginated(
        &self,
        segment: &str,
        pagination: &Pagination,
        mut params: Vec<(String, String)>,
    ) -> Result<Wrapped> {
        params.extend(pagination.to_params()?);
        self.get(segment, GetOptions::default(), &params).await
    }
}

impl fmt::Debug for Mixcloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mixcloud")
            .field("api_root", &self.inner.config.api_root)
            .field("authorized", &self.access_token().is_some())
            .field("raise_exceptions", &self.raise_exceptions())
            .field("operations", &self.inner.operations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_targeted_operation() {
        let client = Mixcloud::new(ClientConfig::default()).unwrap();
        let mut expected: Vec<String> = TargetedAction::ALL
            .iter()
            .map(|action| action.name().to_string())
            .collect();
        expected.sort();
        assert_eq!(client.operations().names(), expected);
        assert_eq!(expected.len(), 12);
    }

    #[test]
    fn handle_lives_as_long_as_a_clone() {
        let client = Mixcloud::new(ClientConfig::default()).unwrap();
        let handle = client.handle();
        let clone = client.clone();
        drop(client);
        assert!(handle.is_live());
        drop(clone);
        assert!(!handle.is_live());
    }

    #[test]
    fn access_token_is_shared_between_clones() {
        let client = Mixcloud::new(ClientConfig::default()).unwrap();
        let clone = client.clone();
        client.set_access_token(Some("t".to_string()));
        assert_eq!(clone.access_token().as_deref(), Some("t"));
        assert!(!format!("{:?}", clone).contains("\"t\""));
    }

    #[test]
    fn search_type_round_trips_names() {
        for search_type in [SearchType::Cloudcast, SearchType::User, SearchType::Tag] {
            assert_eq!(search_type.as_str().parse::<SearchType>().unwrap(), search_type);
        }
        assert!("track".parse::<SearchType>().is_err());
        assert_eq!(SearchType::default(), SearchType::Cloudcast);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = Mixcloud::new(ClientConfig::default().with_api_root("nope")).unwrap_err();
        assert!(matches!(err, ClientError::Url(_)));
    }

    #[tokio::test]
    async fn personal_endpoints_need_a_token() {
        let client = Mixcloud::new(ClientConfig::default()).unwrap();
        let err = client.me().await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(ref m) if m == "access_token must be set"));
    }
}
