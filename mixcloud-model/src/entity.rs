//! Entities: uniquely addressable API resources
//!
//! An entity is a [`KeyedMapping`] carrying a `type` field and usually a
//! `key`. On top of plain mapping access it offers:
//!
//! - **Connections**: server-declared links to related collections, read
//!   from `metadata.connections` and fetched with [`Entity::connection`]
//! - **Loading**: [`Entity::load`] replaces an abbreviated embedded
//!   entity with the full server-side representation
//! - **Targeted operations**: client operations that take an entity key
//!   first, resolved by name with [`Entity::targeted`]
//!
//! [`Entity::member`] combines all of these into a single by-name
//! lookup, in the order: connections, attributes and keys, targeted
//! operations.

use crate::constants::{CONNECTIONS_FIELD, KEY_FIELD, METADATA_FIELD, TYPE_FIELD};
use crate::context::ContextHandle;
use crate::error::{ModelError, Result};
use crate::mapping::KeyedMapping;
use crate::pagination::Pagination;
use crate::targeted::{BoundOperation, Targeted};
use crate::wrap::Wrapped;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Named link from an entity to a collection of related entities
#[derive(Debug, Clone)]
pub struct Connection {
    name: String,
    url: String,
    context: ContextHandle,
}

impl Connection {
    /// Connection name, with hyphens replaced by underscores.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute URL of the related collection.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch one page of the related collection.
    pub async fn fetch(&self, pagination: &Pagination) -> Result<Wrapped> {
        let params = pagination.to_params()?;
        let context = self.context.upgrade()?;
        context.fetch_absolute(&self.url, &params).await
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.url == other.url
    }
}

/// Result of resolving a name on an [`Entity`]
#[derive(Debug, Clone)]
pub enum Member {
    /// Instance attribute set with [`Entity::set_attribute`]
    Attribute(Value),
    /// Value stored under the name
    Value(Wrapped),
    /// Server-declared connection
    Connection(Connection),
    /// Targeted operation bound to the entity key
    Operation(BoundOperation),
}

/// A uniquely addressable API resource
#[derive(Debug, Clone)]
pub struct Entity {
    mapping: KeyedMapping,
    full: bool,
    connections: BTreeMap<String, Connection>,
}

impl Entity {
    /// Wrap a resource object.
    ///
    /// Connections are read only when `full` and `create_connections`
    /// are both set, so entities embedded in list responses carry none
    /// until they are loaded.
    pub fn new(
        data: Map<String, Value>,
        context: ContextHandle,
        full: bool,
        create_connections: bool,
    ) -> Self {
        let mut entity = Self {
            mapping: KeyedMapping::new(data, context),
            full,
            connections: BTreeMap::new(),
        };
        if full && create_connections {
            entity.create_connections();
        }
        entity
    }

    fn create_connections(&mut self) {
        let declared = self
            .mapping
            .raw(METADATA_FIELD)
            .and_then(|metadata| metadata.get(CONNECTIONS_FIELD))
            .and_then(Value::as_object);

        let Some(declared) = declared else {
            return;
        };

        for (name, url) in declared {
            let Some(url) = url.as_str() else {
                tracing::debug!(connection = %name, "skipping connection without URL");
                continue;
            };
            let name = name.replace('-', "_");
            self.connections.insert(
                name.clone(),
                Connection {
                    name,
                    url: url.to_string(),
                    context: self.mapping.context().clone(),
                },
            );
        }
    }

    /// The entity's key, if present.
    pub fn key(&self) -> Option<&str> {
        self.mapping.raw(KEY_FIELD).and_then(Value::as_str)
    }

    /// The entity's type tag, if it is a string.
    pub fn entity_type(&self) -> Option<&str> {
        self.mapping.raw(TYPE_FIELD).and_then(Value::as_str)
    }

    /// Whether the entity carries its full server-side representation.
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Connections by name.
    pub fn connections(&self) -> &BTreeMap<String, Connection> {
        &self.connections
    }

    /// Connection names, sorted.
    pub fn connection_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.connections.keys().map(String::as_str)
    }

    /// Fetch one page of the connection called `name`.
    ///
    /// Hyphens in `name` are read as underscores, as in the API's
    /// connection names (`listen-later` is `listen_later`).
    pub async fn connection(&self, name: &str, pagination: &Pagination) -> Result<Wrapped> {
        let connection = self.connections.get(&name.replace('-', "_")).ok_or_else(|| {
            ModelError::AttributeNotFound {
                type_name: "Entity",
                name: name.to_string(),
            }
        })?;
        connection.fetch(pagination).await
    }

    /// Targeted operation `name` bound to this entity's key.
    ///
    /// Entities without a key, or whose context is gone, have no
    /// targeted operations.
    pub fn targeted(&self, name: &str) -> Targeted {
        let Some(key) = self.key() else {
            return Targeted::NotFound;
        };
        let Ok(context) = self.mapping.context().upgrade() else {
            return Targeted::NotFound;
        };
        match context.operations().get(name) {
            Some(operation) => Targeted::Found(BoundOperation::new(key, operation)),
            None => Targeted::NotFound,
        }
    }

    /// Resolve `name` as an instance attribute, connection, key, or
    /// targeted operation, in that order.
    ///
    /// When nothing matches, the attribute-not-found failure of the
    /// mapping lookup is returned unchanged.
    pub fn member(&self, name: &str) -> Result<Member> {
        if let Some(value) = self.mapping.attribute(name) {
            return Ok(Member::Attribute(value.clone()));
        }
        if let Some(connection) = self.connections.get(name) {
            return Ok(Member::Connection(connection.clone()));
        }
        match self.attr(name) {
            Ok(value) => Ok(Member::Value(value)),
            Err(err) => match self.targeted(name) {
                Targeted::Found(operation) => Ok(Member::Operation(operation)),
                Targeted::NotFound => Err(err),
            },
        }
    }

    /// Load the full representation from the server.
    ///
    /// Does nothing if the entity is already full and `force` is false.
    /// Otherwise fetches the entity by key, merges the result into this
    /// entity, rebuilds connections and marks the entity full.
    pub async fn load(&mut self, force: bool) -> Result<&mut Self> {
        if self.full && !force {
            return Ok(self);
        }

        let key = self
            .key()
            .ok_or_else(|| ModelError::KeyNotFound(KEY_FIELD.to_string()))?
            .to_string();
        tracing::debug!(key = %key, force, "loading entity");

        let context = self.mapping.context().upgrade()?;
        let fetched = context.fetch_by_key(&key, false).await?;
        if let Some(mapping) = fetched.as_mapping() {
            self.mapping.update(mapping.as_map().clone());
        }

        self.connections.clear();
        self.create_connections();
        self.full = true;
        Ok(self)
    }

    /// Wrapped value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Wrapped> {
        self.mapping.get(key)
    }

    /// Attribute-style lookup over instance attributes and keys.
    pub fn attr(&self, name: &str) -> Result<Wrapped> {
        self.mapping.attr_as(name, "Entity")
    }

    /// Set an instance attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.mapping.set_attribute(name, value);
    }

    /// Mapping view of the entity.
    pub fn mapping(&self) -> &KeyedMapping {
        &self.mapping
    }

    /// Unwrap into the mapping view.
    pub fn into_mapping(self) -> KeyedMapping {
        self.mapping
    }

    /// Human-readable type: underscores become spaces, words title-cased.
    pub fn display_type(&self) -> String {
        let raw = self.entity_type().unwrap_or_default();
        raw.split('_')
            .map(title_case)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.mapping == other.mapping
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Entity: {} '{}'>",
            self.display_type(),
            self.key().unwrap_or_default()
        )
    }
}
