//! # Secret Store
//!
//! The cluster-facing interface the sync pipeline writes through.
//!
//! The pipeline only ever sees [`SecretStore`]; the production implementation
//! is [`KubeSecretStore`] and tests substitute an in-memory store. A single
//! store handle is created by the caller and passed down explicitly.

use crate::model::{LiveSecret, ReconciledSecret, SecretKey, StringMap};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

pub mod kubernetes;

pub use kubernetes::KubeSecretStore;

/// Store operation, used for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    PatchMetadata,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::List => "list",
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::PatchMetadata => "patch metadata of",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("secret {0} not found")]
    NotFound(SecretKey),
    #[error("failed to {operation} {target}: {source}")]
    Request {
        operation: Operation,
        /// `namespace/name` for object calls, `namespace` for list calls
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("cluster returned an unusable secret: {0}")]
    Malformed(#[from] crate::model::ModelError),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Namespaced CRUD plus a metadata-only patch over Secret objects.
///
/// Every call is awaited to completion before the next one is issued; no
/// implementation is expected to retry.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// All secrets currently stored in `namespace`
    async fn list(&self, namespace: &str) -> Result<Vec<LiveSecret>, StoreError>;

    /// Fetch one secret; absent objects yield [`StoreError::NotFound`]
    async fn get(&self, namespace: &str, name: &str) -> Result<LiveSecret, StoreError>;

    async fn create(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError>;

    /// Replace an existing secret in place using its markers
    async fn update(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError>;

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    /// Merge-patch `metadata.labels` and `metadata.annotations`, leaving every
    /// other field untouched. Absent objects yield [`StoreError::NotFound`].
    async fn patch_metadata(
        &self,
        namespace: &str,
        name: &str,
        labels: &StringMap,
        annotations: &StringMap,
    ) -> Result<(), StoreError>;
}
