//! Error types for the Mixcloud model

use thiserror::Error;

/// Boxed failure raised by a client context while fetching data
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Model error types
#[derive(Debug, Error)]
pub enum ModelError {
    /// Key is absent from a mapping, or no entity in a sequence carries it.
    #[error("Key not found: {0:?}")]
    KeyNotFound(String),
    /// Attribute-style lookup found neither a stored key nor a member.
    #[error("{type_name:?} object has no attribute {name:?}")]
    AttributeNotFound {
        /// Name of the wrapper type the lookup was made on
        type_name: &'static str,
        /// Requested attribute name
        name: String,
    },
    /// Positional index outside the sequence bounds.
    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// Requested position
        index: usize,
        /// Sequence length
        len: usize,
    },
    /// Caller supplied arguments that cannot be combined.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
    /// Value could not be interpreted as a date/time.
    #[error("Invalid datetime: expected datetime, valid datetime string or timestamp, got {0:?}")]
    InvalidDateTime(String),
    /// Mapping is not a page envelope (no `data` sequence).
    #[error("Not a page envelope: {0}")]
    NotAPage(String),
    /// A targeted operation with the same name is already registered.
    #[error("Operation already registered: {name:?}")]
    OperationAlreadyRegistered {
        /// Name of the duplicate operation
        name: String,
    },
    /// The client context behind a wrapper has been dropped.
    #[error("Client context is no longer available")]
    ContextDropped,
    /// Failure raised by the client context during a fetch, passed through unchanged.
    #[error(transparent)]
    Fetch(FetchError),
}

impl ModelError {
    /// Wrap a collaborator failure so it can travel through model operations.
    pub fn fetch<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ModelError::Fetch(Box::new(error))
    }

    /// Whether this is a missing key or missing attribute failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ModelError::KeyNotFound(_) | ModelError::AttributeNotFound { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ModelError>;
