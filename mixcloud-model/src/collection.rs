//! Entity collections: one page of a resource list

use crate::constants::{DATA_FIELD, NAME_FIELD, NEXT_LINK, PAGING_FIELD, PREVIOUS_LINK};
use crate::context::ContextHandle;
use crate::error::{ModelError, Result};
use crate::mapping::KeyedMapping;
use crate::sequence::{KeyedSequence, SequenceIndex};
use crate::wrap::Wrapped;
use serde_json::{Map, Value};
use std::fmt;

/// A page envelope `{data: [...], paging: {previous?, next?}, name?}`
///
/// String lookups check the envelope first and then the entities in
/// `data`; positional access, iteration and length always concern
/// `data`.
#[derive(Debug, Clone)]
pub struct EntityCollection {
    mapping: KeyedMapping,
    data: KeyedSequence,
}

impl EntityCollection {
    /// Wrap a page envelope.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotAPage`] if `data` is missing or not an array.
    pub fn new(envelope: Map<String, Value>, context: ContextHandle) -> Result<Self> {
        let items = match envelope.get(DATA_FIELD) {
            Some(Value::Array(items)) => items.clone(),
            Some(_) => {
                return Err(ModelError::NotAPage(format!(
                    "{:?} field is not a sequence",
                    DATA_FIELD
                )))
            }
            None => {
                return Err(ModelError::NotAPage(format!(
                    "missing {:?} field",
                    DATA_FIELD
                )))
            }
        };
        Ok(Self {
            data: KeyedSequence::new(items, context.clone()),
            mapping: KeyedMapping::new(envelope, context),
        })
    }

    /// Envelope field `key`, falling back to the entity with that key.
    pub fn get(&self, key: &str) -> Result<Wrapped> {
        match self.mapping.get(key) {
            Ok(value) => Ok(value),
            Err(ModelError::KeyNotFound(_)) => self.data.find(key),
            Err(err) => Err(err),
        }
    }

    /// Entity at `position` in `data`.
    pub fn index(&self, position: usize) -> Result<Wrapped> {
        self.data.index(position)
    }

    /// Positional or by-key access into `data`, bypassing the envelope.
    pub fn item(&self, index: impl Into<SequenceIndex>) -> Result<Wrapped> {
        self.data.get(index)
    }

    /// The contained entities.
    pub fn data(&self) -> &KeyedSequence {
        &self.data
    }

    /// Wrapped entities in order.
    pub fn iter(&self) -> impl Iterator<Item = Wrapped> + '_ {
        self.data.iter()
    }

    /// Number of contained entities.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the page holds no entities.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Display name of the collection, if the envelope has one.
    pub fn name(&self) -> Option<&str> {
        self.mapping.raw(NAME_FIELD).and_then(Value::as_str)
    }

    /// URL stored under `paging.{link}`, if any.
    pub fn paging_url(&self, link: &str) -> Option<&str> {
        self.mapping
            .raw(PAGING_FIELD)
            .and_then(|paging| paging.get(link))
            .and_then(Value::as_str)
    }

    /// Whether a next page is linked.
    pub fn has_next(&self) -> bool {
        self.paging_url(NEXT_LINK).is_some()
    }

    /// Whether a previous page is linked.
    pub fn has_previous(&self) -> bool {
        self.paging_url(PREVIOUS_LINK).is_some()
    }

    /// Fetch the next page, or `None` past the last page.
    pub async fn next(&self) -> Result<Option<Wrapped>> {
        self.navigate(NEXT_LINK).await
    }

    /// Fetch the previous page, or `None` before the first page.
    pub async fn previous(&self) -> Result<Option<Wrapped>> {
        self.navigate(PREVIOUS_LINK).await
    }

    async fn navigate(&self, link: &str) -> Result<Option<Wrapped>> {
        let Some(url) = self.paging_url(link) else {
            return Ok(None);
        };
        tracing::debug!(link, url, "following paging link");
        let context = self.mapping.context().upgrade()?;
        context.fetch_absolute(url, &[]).await.map(Some)
    }

    /// Mapping view of the envelope.
    pub fn mapping(&self) -> &KeyedMapping {
        &self.mapping
    }

    /// Unwrap into the envelope mapping.
    pub fn into_mapping(self) -> KeyedMapping {
        self.mapping
    }
}

impl PartialEq for EntityCollection {
    fn eq(&self, other: &Self) -> bool {
        self.mapping == other.mapping
    }
}

impl fmt::Display for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<EntityCollection '{}'>", name),
            None => f.write_str("<EntityCollection>"),
        }
    }
}
