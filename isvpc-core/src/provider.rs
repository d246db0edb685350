//! Provider - Trait abstracting resource operations
//!
//! A Provider defines operations for a specific infrastructure API.
//! It is responsible for converting Effects into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Broad classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client/session initialization (credentials, endpoints)
    ClientInit,
    /// Any other failure returned by the remote API
    Api,
    /// The remote object does not exist (HTTP 404)
    NotFound,
    /// The remote object is busy or in use (HTTP 409)
    Conflict,
    /// An asynchronous operation did not complete in time
    Timeout,
    /// Configuration attributes are invalid
    Validation,
    /// Local state could not be built or persisted
    State,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::ClientInit => "client init",
            ErrorKind::Api => "api",
            ErrorKind::NotFound => "not found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Validation => "validation",
            ErrorKind::State => "state",
        };
        f.write_str(s)
    }
}

/// Where an error happened: resource type, operation, and sub-step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLabels {
    pub resource_type: String,
    pub operation: String,
    pub step: Option<String>,
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub kind: ErrorKind,
    pub resource_id: Option<ResourceId>,
    pub labels: Option<ErrorLabels>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] ", id)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(ref labels) = self.labels {
            write!(f, " ({}/{}", labels.resource_type, labels.operation)?;
            if let Some(ref step) = labels.step {
                write!(f, "/{}", step)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Api,
            resource_id: None,
            labels: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ErrorKind::Validation)
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// Attach (resource type, operation) labels, keeping any step already set
    pub fn labeled(mut self, resource_type: &str, operation: &str) -> Self {
        let step = self.labels.take().and_then(|l| l.step);
        self.labels = Some(ErrorLabels {
            resource_type: resource_type.to_string(),
            operation: operation.to_string(),
            step,
        });
        self
    }

    /// Attach all three labels
    pub fn at_step(mut self, resource_type: &str, operation: &str, step: &str) -> Self {
        self.labels = Some(ErrorLabels {
            resource_type: resource_type.to_string(),
            operation: operation.to_string(),
            step: Some(step.to_string()),
        });
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == ErrorKind::Conflict
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "is_subnet")
    fn name(&self) -> &'static str;

    /// Attribute schema for this resource type
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(self.name())
    }

    /// Whether the type can be declared as a read-only data source
    fn supports_data_source(&self) -> bool {
        false
    }
}

/// Main Provider trait
///
/// All operations are async and involve side effects.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "ibm")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// With an identifier the resource is read directly and a missing remote
    /// object yields `State::not_found()`. Without one, data sources are looked
    /// up by the attributes in `resource` and managed resources are not found.
    fn read(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the backend ID
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource. Deleting an already-absent resource succeeds.
    ///
    /// `from` is the last recorded state of the resource.
    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn read(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(resource, identifier)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier, from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            resource: &Resource,
            _identifier: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            Box::pin(async move { Ok(State::not_found(id)) })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let id = resource.id.clone();
            let attrs = resource.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs).with_identifier("mock-id-123")) })
        }

        fn update(
            &self,
            id: &ResourceId,
            _identifier: &str,
            _from: &State,
            to: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            let id = id.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State::existing(id, attrs)) })
        }

        fn delete(
            &self,
            _id: &ResourceId,
            _identifier: &str,
            _from: &State,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider = MockProvider;
        let resource = Resource::new("test", "example");
        let state = provider.read(&resource, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn boxed_provider_delegates() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let state = provider
            .create(&Resource::new("test", "example"))
            .await
            .unwrap();
        assert!(state.exists);
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
        assert_eq!(provider.name(), "mock");
    }

    #[test]
    fn error_display_includes_labels() {
        let err = ProviderError::new("boom")
            .for_resource(ResourceId::new("is_subnet", "web"))
            .at_step("is_subnet", "delete", "wait-deleted");
        assert_eq!(
            err.to_string(),
            "[is_subnet.web] boom (is_subnet/delete/wait-deleted)"
        );
    }

    #[test]
    fn labeled_keeps_existing_step() {
        let err = ProviderError::new("boom")
            .at_step("is_subnet", "create", "wait-available")
            .labeled("is_subnet", "update");
        let labels = err.labels.unwrap();
        assert_eq!(labels.operation, "update");
        assert_eq!(labels.step.as_deref(), Some("wait-available"));
    }

    #[test]
    fn error_kind_helpers() {
        let err = ProviderError::new("gone").with_kind(ErrorKind::NotFound);
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert_eq!(ProviderError::validation("bad").kind, ErrorKind::Validation);
    }
}
