//! Keyed sequence: positional access plus lookup by entity key

use crate::constants::KEY_FIELD;
use crate::context::ContextHandle;
use crate::error::{ModelError, Result};
use crate::wrap::{classify, Shape, Wrapped};
use serde_json::Value;
use std::fmt;

/// Index into a [`KeyedSequence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceIndex {
    /// Zero-based position
    Position(usize),
    /// Entity key, normalized before matching
    Key(String),
}

impl From<usize> for SequenceIndex {
    fn from(position: usize) -> Self {
        SequenceIndex::Position(position)
    }
}

impl From<&str> for SequenceIndex {
    fn from(key: &str) -> Self {
        SequenceIndex::Key(key.to_string())
    }
}

impl From<String> for SequenceIndex {
    fn from(key: String) -> Self {
        SequenceIndex::Key(key)
    }
}

/// Surround a resource key with slashes, keeping interior slashes.
///
/// `"bob"`, `"/bob"`, `"bob/"` and `"/bob/"` all become `"/bob/"`.
pub fn normalize_key(key: &str) -> String {
    let mut normalized = String::with_capacity(key.len() + 2);
    if !key.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(key);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

/// JSON array whose elements come back wrapped
#[derive(Debug, Clone)]
pub struct KeyedSequence {
    data: Vec<Value>,
    context: ContextHandle,
}

impl KeyedSequence {
    /// Wrap a JSON array.
    pub fn new(data: Vec<Value>, context: ContextHandle) -> Self {
        Self { data, context }
    }

    /// Positional or by-key access.
    pub fn get(&self, index: impl Into<SequenceIndex>) -> Result<Wrapped> {
        match index.into() {
            SequenceIndex::Position(position) => self.index(position),
            SequenceIndex::Key(key) => self.find(&key),
        }
    }

    /// Bounds-checked positional access.
    pub fn index(&self, position: usize) -> Result<Wrapped> {
        self.data
            .get(position)
            .map(|value| classify(value.clone(), &self.context))
            .ok_or(ModelError::IndexOutOfRange {
                index: position,
                len: self.data.len(),
            })
    }

    /// First entity element whose `key` equals the normalized `key`.
    pub fn find(&self, key: &str) -> Result<Wrapped> {
        let key = normalize_key(key);
        self.data
            .iter()
            .find(|value| {
                Shape::of(value) == Shape::Entity
                    && value.get(KEY_FIELD).and_then(Value::as_str) == Some(key.as_str())
            })
            .map(|value| classify(value.clone(), &self.context))
            .ok_or(ModelError::KeyNotFound(key))
    }

    /// Wrapped elements in order.
    pub fn iter(&self) -> impl Iterator<Item = Wrapped> + '_ {
        self.data
            .iter()
            .map(move |value| classify(value.clone(), &self.context))
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Backing JSON array.
    pub fn as_slice(&self) -> &[Value] {
        &self.data
    }

    /// Unwrap into the backing JSON array.
    pub fn into_vec(self) -> Vec<Value> {
        self.data
    }

    /// Handle to the client context shared with wrapped elements.
    pub fn context(&self) -> &ContextHandle {
        &self.context
    }
}

impl PartialEq for KeyedSequence {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Display for KeyedSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.data).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
