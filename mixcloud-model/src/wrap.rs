//! Shape classification and the wrapped value union

use crate::collection::EntityCollection;
use crate::constants::TYPE_FIELD;
use crate::context::ContextHandle;
use crate::datetime::to_datetime;
use crate::entity::Entity;
use crate::error::{ModelError, Result};
use crate::mapping::KeyedMapping;
use crate::sequence::KeyedSequence;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

/// Inferred kind of a decoded JSON value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Object carrying a `type` discriminator
    Entity,
    /// Any other object
    Mapping,
    /// Array
    Sequence,
    /// String, number, boolean or null
    Scalar,
}

impl Shape {
    /// Classify a value by shape.
    pub fn of(value: &Value) -> Shape {
        match value {
            Value::Object(map) if map.contains_key(TYPE_FIELD) => Shape::Entity,
            Value::Object(_) => Shape::Mapping,
            Value::Array(_) => Shape::Sequence,
            _ => Shape::Scalar,
        }
    }
}

/// A decoded JSON value turned into a navigable result object
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapped {
    /// API resource
    Entity(Entity),
    /// Page of resources with navigation links
    Collection(EntityCollection),
    /// Plain object
    Mapping(KeyedMapping),
    /// Array
    Sequence(KeyedSequence),
    /// Scalar, returned unchanged
    Scalar(Value),
}

/// Wrap a decoded value according to its [`Shape`].
///
/// Objects with a `type` key become partial entities; this never
/// produces a collection, since only the client knows that a value is a
/// top-level page envelope.
pub fn classify(value: Value, context: &ContextHandle) -> Wrapped {
    match (Shape::of(&value), value) {
        (Shape::Entity, Value::Object(map)) => {
            Wrapped::Entity(Entity::new(map, context.clone(), false, true))
        }
        (_, Value::Object(map)) => Wrapped::Mapping(KeyedMapping::new(map, context.clone())),
        (_, Value::Array(items)) => Wrapped::Sequence(KeyedSequence::new(items, context.clone())),
        (_, scalar) => Wrapped::Scalar(scalar),
    }
}

impl Wrapped {
    /// Shape of the wrapped value. Collections report [`Shape::Mapping`].
    pub fn shape(&self) -> Shape {
        match self {
            Wrapped::Entity(_) => Shape::Entity,
            Wrapped::Collection(_) | Wrapped::Mapping(_) => Shape::Mapping,
            Wrapped::Sequence(_) => Shape::Sequence,
            Wrapped::Scalar(_) => Shape::Scalar,
        }
    }

    /// Look up a string key, whatever the wrapper kind.
    ///
    /// Sequences resolve the key against their entities' keys.
    pub fn get(&self, key: &str) -> Result<Wrapped> {
        match self {
            Wrapped::Entity(entity) => entity.get(key),
            Wrapped::Collection(collection) => collection.get(key),
            Wrapped::Mapping(mapping) => mapping.get(key),
            Wrapped::Sequence(sequence) => sequence.find(key),
            Wrapped::Scalar(_) => Err(ModelError::KeyNotFound(key.to_string())),
        }
    }

    /// Borrow as an entity.
    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Wrapped::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Convert into an entity.
    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Wrapped::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Borrow as a collection.
    pub fn as_collection(&self) -> Option<&EntityCollection> {
        match self {
            Wrapped::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Convert into a collection.
    pub fn into_collection(self) -> Option<EntityCollection> {
        match self {
            Wrapped::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Mapping view of any object-backed wrapper.
    pub fn as_mapping(&self) -> Option<&KeyedMapping> {
        match self {
            Wrapped::Entity(entity) => Some(entity.mapping()),
            Wrapped::Collection(collection) => Some(collection.mapping()),
            Wrapped::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }

    /// Borrow as a sequence.
    pub fn as_sequence(&self) -> Option<&KeyedSequence> {
        match self {
            Wrapped::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// Borrow the scalar value.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Wrapped::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// String scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }

    /// Integer scalar.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_scalar().and_then(Value::as_i64)
    }

    /// Boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        self.as_scalar().and_then(Value::as_bool)
    }

    /// Whether this is the `null` scalar.
    pub fn is_null(&self) -> bool {
        matches!(self, Wrapped::Scalar(Value::Null))
    }

    /// Interpret a scalar as a date/time (string or UNIX timestamp).
    pub fn datetime(&self) -> Result<DateTime<Utc>> {
        match self {
            Wrapped::Scalar(value) => to_datetime(value),
            other => Err(ModelError::InvalidDateTime(other.to_value().to_string())),
        }
    }

    /// Copy of the underlying JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Wrapped::Entity(entity) => Value::Object(entity.mapping().as_map().clone()),
            Wrapped::Collection(collection) => {
                Value::Object(collection.mapping().as_map().clone())
            }
            Wrapped::Mapping(mapping) => Value::Object(mapping.as_map().clone()),
            Wrapped::Sequence(sequence) => Value::Array(sequence.as_slice().to_vec()),
            Wrapped::Scalar(value) => value.clone(),
        }
    }

    /// Unwrap into the underlying JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Wrapped::Entity(entity) => Value::Object(entity.into_mapping().into_map()),
            Wrapped::Collection(collection) => Value::Object(collection.into_mapping().into_map()),
            Wrapped::Mapping(mapping) => Value::Object(mapping.into_map()),
            Wrapped::Sequence(sequence) => Value::Array(sequence.into_vec()),
            Wrapped::Scalar(value) => value,
        }
    }
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wrapped::Entity(entity) => fmt::Display::fmt(entity, f),
            Wrapped::Collection(collection) => fmt::Display::fmt(collection, f),
            Wrapped::Mapping(mapping) => fmt::Display::fmt(mapping, f),
            Wrapped::Sequence(sequence) => fmt::Display::fmt(sequence, f),
            Wrapped::Scalar(value) => fmt::Display::fmt(value, f),
        }
    }
}
