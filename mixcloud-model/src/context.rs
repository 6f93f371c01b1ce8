//! The seam between the model layer and the HTTP client
//!
//! Wrappers never own the client that produced them. They carry a
//! [`ContextHandle`], a weak reference that is upgraded only for the
//! duration of a single fetch.

use crate::error::{ModelError, Result};
use crate::targeted::OperationRegistry;
use crate::wrap::Wrapped;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Weak};

/// Capabilities the model layer consumes from the surrounding client
#[async_trait]
pub trait ClientContext: Send + Sync {
    /// Fetch a resource by its key, relative to the API root.
    ///
    /// `create_connections` controls whether a full entity produced by
    /// this fetch synthesizes its connections.
    async fn fetch_by_key(&self, key: &str, create_connections: bool) -> Result<Wrapped>;

    /// Fetch an absolute URL, merging `params` into its query string.
    async fn fetch_absolute(&self, url: &str, params: &[(String, String)]) -> Result<Wrapped>;

    /// Operations that can be bound to an entity key.
    fn operations(&self) -> &OperationRegistry;
}

/// Context that can never be upgraded, backing [`ContextHandle::detached`]
enum Detached {}

#[async_trait]
impl ClientContext for Detached {
    async fn fetch_by_key(&self, _key: &str, _create_connections: bool) -> Result<Wrapped> {
        match *self {}
    }

    async fn fetch_absolute(&self, _url: &str, _params: &[(String, String)]) -> Result<Wrapped> {
        match *self {}
    }

    fn operations(&self) -> &OperationRegistry {
        match *self {}
    }
}

/// Non-owning handle to a [`ClientContext`]
#[derive(Clone)]
pub struct ContextHandle(Weak<dyn ClientContext>);

impl ContextHandle {
    /// Create a handle pointing at a live context.
    pub fn new<C>(context: &Arc<C>) -> Self
    where
        C: ClientContext + 'static,
    {
        let weak: Weak<C> = Arc::downgrade(context);
        Self(weak)
    }

    /// Create a handle from an existing weak reference.
    ///
    /// Used by contexts that hand out handles to themselves while still
    /// under construction.
    pub fn from_weak<C>(context: Weak<C>) -> Self
    where
        C: ClientContext + 'static,
    {
        Self(context)
    }

    /// Handle that is not attached to any client.
    ///
    /// Wrappers built with it can be navigated locally, but every fetch
    /// fails with [`ModelError::ContextDropped`].
    pub fn detached() -> Self {
        let weak: Weak<Detached> = Weak::new();
        Self(weak)
    }

    /// Upgrade to a strong reference for the duration of one operation.
    pub fn upgrade(&self) -> Result<Arc<dyn ClientContext>> {
        self.0.upgrade().ok_or(ModelError::ContextDropped)
    }

    /// Whether the context behind this handle is still alive.
    pub fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Default for ContextHandle {
    fn default() -> Self {
        Self::detached()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_handle_never_upgrades() {
        let handle = ContextHandle::detached();
        assert!(!handle.is_live());
        assert!(matches!(handle.upgrade(), Err(ModelError::ContextDropped)));
    }

    #[test]
    fn debug_reports_liveness() {
        let handle = ContextHandle::default();
        assert_eq!(format!("{:?}", handle), "ContextHandle { live: false }");
    }
}
