//! Mixcloud Model - Navigable wrappers over decoded Mixcloud API responses
//!
//! This crate turns plain decoded JSON into result objects that can be
//! navigated without knowing the API's schema up front. It performs no
//! network I/O itself; everything that needs more data goes through a
//! [`ClientContext`] supplied by the HTTP layer. It includes:
//!
//! - Shape classification of JSON values ([`classify`], [`Shape`])
//! - Keyed mappings and sequences with wrapped element access
//! - Entities (API resources) with connections, lazy loading and
//!   targeted-operation delegation
//! - Entity collections with page navigation
//! - Pagination parameters and datetime normalization
//! - Error types

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod collection;
pub mod constants;
pub mod context;
pub mod datetime;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod pagination;
pub mod sequence;
pub mod targeted;
pub mod wrap;

// Re-export commonly used types
pub use collection::EntityCollection;
pub use context::{ClientContext, ContextHandle};
pub use datetime::{format_datetime, to_datetime, to_timestamp, DateTimeLike};
pub use entity::{Connection, Entity, Member};
pub use error::{ModelError, Result};
pub use mapping::KeyedMapping;
pub use pagination::{Pagination, QueryParams};
pub use sequence::{normalize_key, KeyedSequence, SequenceIndex};
pub use targeted::{BoundOperation, OperationRegistry, Targeted, TargetedOperation};
pub use wrap::{classify, Shape, Wrapped};
