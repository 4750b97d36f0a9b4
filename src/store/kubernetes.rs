//! # Kubernetes Secret Store
//!
//! [`SecretStore`] backed by the core/v1 Secrets API.

use super::{Operation, SecretStore, StoreError};
use crate::model::{LiveSecret, ReconciledSecret, SecretKey, StringMap};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams},
    Client,
};
use serde_json::json;
use tracing::debug;

#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// 404 becomes [`StoreError::NotFound`]; everything else keeps the kube error as source
fn object_error(operation: Operation, namespace: &str, name: &str, err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(ref api_err) if api_err.code == 404 => {
            StoreError::NotFound(SecretKey::new(namespace, name))
        }
        other => StoreError::Request {
            operation,
            target: format!("{namespace}/{name}"),
            source: Box::new(other),
        },
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn list(&self, namespace: &str) -> Result<Vec<LiveSecret>, StoreError> {
        let list = self
            .api(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| StoreError::Request {
                operation: Operation::List,
                target: namespace.to_string(),
                source: Box::new(e),
            })?;

        debug!(namespace, count = list.items.len(), "Listed secrets");
        list.items
            .into_iter()
            .map(|secret| LiveSecret::from_api(secret, namespace).map_err(StoreError::from))
            .collect()
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<LiveSecret, StoreError> {
        let secret = self
            .api(namespace)
            .get(name)
            .await
            .map_err(|e| object_error(Operation::Get, namespace, name, e))?;
        Ok(LiveSecret::from_api(secret, namespace)?)
    }

    async fn create(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError> {
        let created = self
            .api(namespace)
            .create(&PostParams::default(), &secret.to_secret())
            .await
            .map_err(|e| object_error(Operation::Create, namespace, &secret.name, e))?;
        Ok(LiveSecret::from_api(created, namespace)?)
    }

    async fn update(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError> {
        let replaced = self
            .api(namespace)
            .replace(&secret.name, &PostParams::default(), &secret.to_secret())
            .await
            .map_err(|e| object_error(Operation::Update, namespace, &secret.name, e))?;
        Ok(LiveSecret::from_api(replaced, namespace)?)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| object_error(Operation::Delete, namespace, name, e))?;
        Ok(())
    }

    async fn patch_metadata(
        &self,
        namespace: &str,
        name: &str,
        labels: &StringMap,
        annotations: &StringMap,
    ) -> Result<(), StoreError> {
        let patch = json!({
            "metadata": {
                "labels": labels,
                "annotations": annotations,
            }
        });

        self.api(namespace)
            .patch(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(|e| object_error(Operation::PatchMetadata, namespace, name, e))?;
        Ok(())
    }
}
