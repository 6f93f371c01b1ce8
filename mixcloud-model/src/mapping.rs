//! Keyed mapping: attribute-style access over a JSON object

use crate::context::ContextHandle;
use crate::datetime::to_datetime;
use crate::error::{ModelError, Result};
use crate::wrap::{classify, Wrapped};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

/// JSON object whose values come back wrapped
///
/// Key access ([`get`](Self::get)) and attribute access
/// ([`attr`](Self::attr)) agree for every stored key, except that
/// attributes set with [`set_attribute`](Self::set_attribute) shadow keys
/// of the same name on the attribute path.
#[derive(Debug, Clone)]
pub struct KeyedMapping {
    data: Map<String, Value>,
    attributes: Map<String, Value>,
    context: ContextHandle,
}

impl KeyedMapping {
    /// Wrap a JSON object.
    pub fn new(data: Map<String, Value>, context: ContextHandle) -> Self {
        Self {
            data,
            attributes: Map::new(),
            context,
        }
    }

    /// Handle to the client context shared with wrapped children.
    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    /// Wrapped value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Wrapped> {
        self.data
            .get(key)
            .map(|value| classify(value.clone(), &self.context))
            .ok_or_else(|| ModelError::KeyNotFound(key.to_string()))
    }

    /// Raw value stored under `key`.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Attribute-style lookup: instance attributes first, then keys.
    pub fn attr(&self, name: &str) -> Result<Wrapped> {
        self.attr_as(name, "KeyedMapping")
    }

    /// Attribute lookup reporting `type_name` on a miss.
    pub(crate) fn attr_as(&self, name: &str, type_name: &'static str) -> Result<Wrapped> {
        if let Some(value) = self.attributes.get(name) {
            return Ok(classify(value.clone(), &self.context));
        }
        self.get(name).map_err(|_| ModelError::AttributeNotFound {
            type_name,
            name: name.to_string(),
        })
    }

    /// Set an instance attribute. It shadows a stored key of the same
    /// name for [`attr`](Self::attr) but not for [`get`](Self::get).
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Instance attribute set with [`set_attribute`](Self::set_attribute).
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Whether `key` is stored.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Keys in backing order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.data.keys().map(String::as_str)
    }

    /// Wrapped values in backing order.
    pub fn values(&self) -> impl Iterator<Item = Wrapped> + '_ {
        self.data
            .values()
            .map(move |value| classify(value.clone(), &self.context))
    }

    /// Key and wrapped value pairs in backing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Wrapped)> + '_ {
        self.data
            .iter()
            .map(move |(key, value)| (key.as_str(), classify(value.clone(), &self.context)))
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Merge `other` into this mapping, overwriting existing keys.
    pub fn update(&mut self, other: Map<String, Value>) {
        for (key, value) in other {
            self.data.insert(key, value);
        }
    }

    /// Backing JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Unwrap into the backing JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }

    /// Value under `key` interpreted as a date/time.
    pub fn datetime(&self, key: &str) -> Result<DateTime<Utc>> {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| ModelError::KeyNotFound(key.to_string()))?;
        to_datetime(value)
    }
}

impl PartialEq for KeyedMapping {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Display for KeyedMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
