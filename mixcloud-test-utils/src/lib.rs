//! Mixcloud Test Utilities
//!
//! Shared fixtures for the Mixcloud workspace: builders for API-shaped
//! JSON and a [`RecordingContext`] that serves canned responses and
//! records every fetch made through it.

use async_trait::async_trait;
use mixcloud_model::{
    ClientContext, ContextHandle, Entity, EntityCollection, ModelError, OperationRegistry,
    TargetedOperation, Wrapped,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Builder for API resource objects
pub struct ResourceBuilder {
    fields: Map<String, Value>,
}

impl ResourceBuilder {
    /// Create a resource of the given type and key
    pub fn new(resource_type: &str, key: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("type".to_string(), Value::String(resource_type.to_string()));
        fields.insert("key".to_string(), Value::String(key.to_string()));
        Self { fields }
    }

    /// A user resource, `/{username}/`
    pub fn user(username: &str) -> Self {
        Self::new("user", &format!("/{}/", username))
            .string("username", username)
            .string("name", username)
    }

    /// A cloudcast resource, `/{username}/{slug}/`
    pub fn cloudcast(username: &str, slug: &str) -> Self {
        Self::new("cloudcast", &format!("/{}/{}/", username, slug))
            .string("slug", slug)
            .string("name", slug)
            .object("user", Self::user(username).build())
    }

    /// A tag resource, `/discover/{name}/`
    pub fn tag(name: &str) -> Self {
        Self::new("tag", &format!("/discover/{}/", name)).string("name", name)
    }

    /// Add a field with a string value
    pub fn string(mut self, key: &str, value: &str) -> Self {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Add a field with an integer value
    pub fn int(mut self, key: &str, value: i64) -> Self {
        self.fields.insert(key.to_string(), Value::Number(value.into()));
        self
    }

    /// Add a field with a boolean value
    pub fn bool(mut self, key: &str, value: bool) -> Self {
        self.fields.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Add a field with an object value
    pub fn object(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Declare a connection under `metadata.connections`
    pub fn connection(mut self, name: &str, url: &str) -> Self {
        let metadata = self
            .fields
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(metadata) = metadata {
            let connections = metadata
                .entry("connections")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(connections) = connections {
                connections.insert(name.to_string(), Value::String(url.to_string()));
            }
        }
        self
    }

    /// Build the resource
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }

    /// Build the resource as a JSON object
    pub fn build_map(self) -> Map<String, Value> {
        self.fields
    }
}

/// Builder for page envelopes (`data`, `paging`, `name`)
#[derive(Default)]
pub struct PageBuilder {
    data: Vec<Value>,
    paging: Map<String, Value>,
    name: Option<String>,
}

impl PageBuilder {
    /// Create an empty page
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource to `data`
    pub fn item(mut self, item: Value) -> Self {
        self.data.push(item);
        self
    }

    /// Append several resources to `data`
    pub fn items(mut self, items: impl IntoIterator<Item = Value>) -> Self {
        self.data.extend(items);
        self
    }

    /// Link the next page
    pub fn next(mut self, url: &str) -> Self {
        self.paging
            .insert("next".to_string(), Value::String(url.to_string()));
        self
    }

    /// Link the previous page
    pub fn previous(mut self, url: &str) -> Self {
        self.paging
            .insert("previous".to_string(), Value::String(url.to_string()));
        self
    }

    /// Set the collection name
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Build the envelope
    pub fn build(self) -> Value {
        let mut envelope = Map::new();
        envelope.insert("data".to_string(), Value::Array(self.data));
        envelope.insert("paging".to_string(), Value::Object(self.paging));
        if let Some(name) = self.name {
            envelope.insert("name".to_string(), Value::String(name));
        }
        Value::Object(envelope)
    }
}

/// Fixture resources shaped like real API responses
pub struct Fixtures;

impl Fixtures {
    /// A full user with the connections the API declares for users
    pub fn full_user(username: &str, api_root: &str) -> Value {
        let base = format!("{}/{}", api_root.trim_end_matches('/'), username);
        [
            "feed",
            "playlists",
            "comments",
            "followers",
            "favorites",
            "following",
            "cloudcasts",
            "listens",
        ]
        .iter()
        .fold(ResourceBuilder::user(username), |builder, name| {
            builder.connection(name, &format!("{}/{}/", base, name))
        })
        .int("follower_count", 42)
        .build()
    }

    /// A page of `count` users, with an optional next link
    pub fn user_page(prefix: &str, count: usize, next: Option<&str>) -> Value {
        let mut page = PageBuilder::new()
            .items((0..count).map(|i| ResourceBuilder::user(&format!("{}{}", prefix, i)).build()));
        if let Some(next) = next {
            page = page.next(next);
        }
        page.build()
    }
}

/// A fetch observed by a [`RecordingContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `fetch_by_key`
    ByKey {
        /// Requested key
        key: String,
        /// Whether connections were requested
        create_connections: bool,
    },
    /// `fetch_absolute`
    Absolute {
        /// Requested URL
        url: String,
        /// Query parameters
        params: Vec<(String, String)>,
    },
}

/// No canned response was registered for a fetch
#[derive(Debug, thiserror::Error)]
#[error("no canned response for {0}")]
pub struct MissingResponse(pub String);

/// Targeted operation that echoes its arguments
struct EchoOperation {
    name: String,
}

#[async_trait]
impl TargetedOperation for EchoOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, key: &str, options: &Value) -> mixcloud_model::Result<Wrapped> {
        Ok(Wrapped::Scalar(json!({
            "operation": self.name,
            "key": key,
            "options": options,
        })))
    }
}

/// Fake client context serving canned responses
///
/// Responses are classified the way the HTTP client classifies them:
/// page envelopes become collections, error payloads plain mappings and
/// every other object a full entity.
pub struct RecordingContext {
    by_key: Mutex<HashMap<String, Value>>,
    by_url: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<Call>>,
    operations: OperationRegistry,
    handle: ContextHandle,
}

impl RecordingContext {
    /// Create a context with no responses and no operations
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            by_key: Mutex::new(HashMap::new()),
            by_url: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            operations: OperationRegistry::new(),
            handle: ContextHandle::from_weak(weak.clone()),
        })
    }

    /// Create a context with echoing operations under the given names
    ///
    /// Fails with `OperationAlreadyRegistered` if a name repeats.
    pub fn with_operations(names: &[&str]) -> mixcloud_model::Result<Arc<Self>> {
        let context = Self::new();
        for name in names {
            let operation = Arc::new(EchoOperation {
                name: name.to_string(),
            });
            context.operations.register(operation)?;
        }
        Ok(context)
    }

    /// Handle for wrappers built against this context
    pub fn handle(&self) -> ContextHandle {
        self.handle.clone()
    }

    /// Serve `value` for `fetch_by_key(key, ..)`
    pub fn respond_to_key(&self, key: &str, value: Value) {
        lock(&self.by_key).insert(key.to_string(), value);
    }

    /// Serve `value` for `fetch_absolute(url, ..)`
    pub fn respond_to_url(&self, url: &str, value: Value) {
        lock(&self.by_url).insert(url.to_string(), value);
    }

    /// Every fetch made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Number of fetches made so far
    pub fn fetch_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Classify a response as the HTTP client would
    pub fn wrap_response(&self, value: Value, create_connections: bool) -> Wrapped {
        match value {
            Value::Object(map) if map.contains_key("error") => {
                Wrapped::Mapping(mixcloud_model::KeyedMapping::new(map, self.handle()))
            }
            Value::Object(map) if matches!(map.get("data"), Some(Value::Array(_))) => {
                match EntityCollection::new(map.clone(), self.handle()) {
                    Ok(collection) => Wrapped::Collection(collection),
                    Err(_) => Wrapped::Entity(Entity::new(map, self.handle(), true, create_connections)),
                }
            }
            Value::Object(map) => {
                Wrapped::Entity(Entity::new(map, self.handle(), true, create_connections))
            }
            other => mixcloud_model::classify(other, &self.handle),
        }
    }

    /// Build an entity against this context
    pub fn entity(&self, value: Value, full: bool) -> Entity {
        let map = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Entity::new(map, self.handle(), full, true)
    }

    /// Build a collection against this context
    pub fn collection(&self, value: Value) -> mixcloud_model::Result<EntityCollection> {
        match value {
            Value::Object(map) => EntityCollection::new(map, self.handle()),
            other => Err(ModelError::NotAPage(other.to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl std::fmt::Debug for RecordingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingContext").finish_non_exhaustive()
    }
}

#[async_trait]
impl ClientContext for RecordingContext {
    async fn fetch_by_key(
        &self,
        key: &str,
        create_connections: bool,
    ) -> mixcloud_model::Result<Wrapped> {
        lock(&self.calls).push(Call::ByKey {
            key: key.to_string(),
            create_connections,
        });
        let response = lock(&self.by_key).get(key).cloned();
        match response {
            Some(value) => Ok(self.wrap_response(value, create_connections)),
            None => Err(ModelError::fetch(MissingResponse(key.to_string()))),
        }
    }

    async fn fetch_absolute(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> mixcloud_model::Result<Wrapped> {
        lock(&self.calls).push(Call::Absolute {
            url: url.to_string(),
            params: params.to_vec(),
        });
        let response = lock(&self.by_url).get(url).cloned();
        match response {
            Some(value) => Ok(self.wrap_response(value, true)),
            None => Err(ModelError::fetch(MissingResponse(url.to_string()))),
        }
    }

    fn operations(&self) -> &OperationRegistry {
        &self.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_nests_connections_under_metadata() {
        let user = ResourceBuilder::user("bob")
            .connection("followers", "https://api/bob/followers/")
            .connection("listen-later", "https://api/bob/listen-later/")
            .build();
        assert_eq!(user["key"], "/bob/");
        assert_eq!(
            user["metadata"]["connections"]["listen-later"],
            "https://api/bob/listen-later/"
        );
    }

    #[test]
    fn page_builder_shapes_envelope() {
        let page = Fixtures::user_page("u", 3, Some("https://api/next"));
        assert_eq!(page["data"].as_array().map(Vec::len), Some(3));
        assert_eq!(page["paging"]["next"], "https://api/next");
        assert_eq!(page["data"][1]["key"], "/u1/");
    }

    #[test]
    fn wrap_response_classifies_like_the_client() {
        let context = RecordingContext::new();
        assert!(context
            .wrap_response(Fixtures::user_page("u", 1, None), true)
            .as_collection()
            .is_some());
        assert!(context
            .wrap_response(json!({"error": {"type": "X"}}), true)
            .as_mapping()
            .is_some());
        let entity = context.wrap_response(Fixtures::full_user("bob", "https://api"), true);
        assert!(entity.as_entity().map(Entity::is_full).unwrap_or(false));
    }

    #[test]
    fn repeated_operation_names_are_rejected() {
        let context = RecordingContext::with_operations(&["follow", "edit"]).unwrap();
        assert_eq!(context.operations().names(), vec!["edit", "follow"]);

        let err = RecordingContext::with_operations(&["follow", "follow"]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::OperationAlreadyRegistered { ref name } if name == "follow"
        ));
    }
}
