//! Targeted operations: client actions that take an entity key first
//!
//! The client registers its key-first operations (follow, favorite,
//! embed, edit, ...) in an [`OperationRegistry`]. An [`Entity`] resolves
//! unknown member names against that registry and hands back a
//! [`BoundOperation`] with the key already applied.
//!
//! [`Entity`]: crate::Entity

use crate::error::{ModelError, Result};
use crate::wrap::Wrapped;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Operation whose first argument is an entity key
#[async_trait]
pub trait TargetedOperation: Send + Sync {
    /// Returns the unique name of this operation
    fn name(&self) -> &str;

    /// Invoke the operation against `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Key of the entity the operation targets
    /// * `options` - Operation-specific options (JSON value, `null` for defaults)
    async fn invoke(&self, key: &str, options: &Value) -> Result<Wrapped>;
}

/// Name to operation table owned by a client context
pub struct OperationRegistry {
    operations: RwLock<HashMap<String, Arc<dyn TargetedOperation>>>,
}

impl OperationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            operations: RwLock::new(HashMap::new()),
        }
    }

    /// Register an operation
    ///
    /// # Errors
    ///
    /// Returns an error if an operation with the same name is already registered
    pub fn register(&self, operation: Arc<dyn TargetedOperation>) -> Result<()> {
        let name = operation.name().to_string();
        let mut operations = self
            .operations
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if operations.contains_key(&name) {
            return Err(ModelError::OperationAlreadyRegistered { name });
        }

        operations.insert(name, operation);
        Ok(())
    }

    /// Unregister an operation by name
    pub fn unregister(&self, name: &str) -> Option<Arc<dyn TargetedOperation>> {
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Get an operation by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn TargetedOperation>> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Whether an operation with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Sorted names of all registered operations
    pub fn names(&self) -> Vec<String> {
        let operations = self
            .operations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = operations.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}

/// Targeted operation with its entity key applied
#[derive(Clone)]
pub struct BoundOperation {
    key: String,
    operation: Arc<dyn TargetedOperation>,
}

impl BoundOperation {
    /// Bind `operation` to `key`.
    pub fn new(key: impl Into<String>, operation: Arc<dyn TargetedOperation>) -> Self {
        Self {
            key: key.into(),
            operation,
        }
    }

    /// Name of the underlying operation.
    pub fn name(&self) -> &str {
        self.operation.name()
    }

    /// Key the operation is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Invoke with default options.
    pub async fn call(&self) -> Result<Wrapped> {
        self.operation.invoke(&self.key, &Value::Null).await
    }

    /// Invoke with operation-specific options.
    pub async fn call_with(&self, options: &Value) -> Result<Wrapped> {
        self.operation.invoke(&self.key, options).await
    }
}

impl fmt::Debug for BoundOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundOperation")
            .field("name", &self.name())
            .field("key", &self.key)
            .finish()
    }
}

/// Outcome of resolving a targeted operation by name
#[derive(Debug, Clone)]
pub enum Targeted {
    /// Operation exists and is bound to the entity key
    Found(BoundOperation),
    /// No operation with that name
    NotFound,
}

impl Targeted {
    /// Convert into an option, dropping the not-found marker.
    pub fn found(self) -> Option<BoundOperation> {
        match self {
            Targeted::Found(operation) => Some(operation),
            Targeted::NotFound => None,
        }
    }

    /// Whether an operation was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Targeted::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoOperation {
        name: String,
    }

    #[async_trait]
    impl TargetedOperation for EchoOperation {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, key: &str, options: &Value) -> Result<Wrapped> {
            Ok(Wrapped::Scalar(serde_json::json!({
                "key": key,
                "options": options,
            })))
        }
    }

    fn echo(name: &str) -> Arc<dyn TargetedOperation> {
        Arc::new(EchoOperation {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = OperationRegistry::new();
        registry.register(echo("follow")).unwrap();

        let retrieved = registry.get("follow").unwrap();
        assert_eq!(retrieved.name(), "follow");
        assert!(registry.contains("follow"));
        assert!(registry.get("unfollow").is_none());
    }

    #[test]
    fn test_registry_duplicate_registration() {
        let registry = OperationRegistry::new();
        registry.register(echo("follow")).unwrap();

        let result = registry.register(echo("follow"));
        assert!(matches!(
            result,
            Err(ModelError::OperationAlreadyRegistered { ref name }) if name == "follow"
        ));
    }

    #[test]
    fn test_registry_unregister_and_names() {
        let registry = OperationRegistry::new();
        registry.register(echo("repost")).unwrap();
        registry.register(echo("favorite")).unwrap();
        assert_eq!(registry.names(), vec!["favorite", "repost"]);

        assert!(registry.unregister("repost").is_some());
        assert!(registry.unregister("repost").is_none());
        assert_eq!(registry.names(), vec!["favorite"]);
    }

    #[tokio::test]
    async fn bound_operation_passes_key_first() {
        let bound = BoundOperation::new("/bob/", echo("follow"));
        assert_eq!(bound.name(), "follow");

        let result = bound.call().await.unwrap();
        assert_eq!(
            result.to_value(),
            serde_json::json!({"key": "/bob/", "options": null})
        );

        let result = bound
            .call_with(&serde_json::json!({"width": 300}))
            .await
            .unwrap();
        assert_eq!(result.to_value()["options"]["width"], 300);
    }

    #[test]
    fn targeted_found_converts_to_option() {
        assert!(Targeted::NotFound.found().is_none());
        let found = Targeted::Found(BoundOperation::new("/a/", echo("edit")));
        assert!(found.is_found());
        assert_eq!(found.found().unwrap().key(), "/a/");
    }
}
