//! Common test utilities for sync pipeline tests
//!
//! Provides an in-memory `SecretStore` that records every call and can be told
//! to fail specific operations, plus builders for templates and live secrets.

#![allow(dead_code, reason = "each test crate uses a different subset of helpers")]

use async_trait::async_trait;
use k8s_openapi::ByteString;
use secret_template_sync::model::{
    ClusterMarkers, DataMap, LiveSecret, ReconciledSecret, SecretKey, SecretTemplate, StringMap,
};
use secret_template_sync::store::{Operation, SecretStore, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// A call made against the fake store, with its namespace and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Get(String, String),
    Create(String, String),
    Update(String, String),
    Delete(String, String),
    PatchMetadata(String, String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::List(_) | Call::Get(..))
    }
}

#[derive(Debug, Clone, Copy)]
enum Remaining {
    Times(usize),
    Always,
}

#[derive(Debug, Default)]
struct State {
    secrets: BTreeMap<SecretKey, LiveSecret>,
    calls: Vec<Call>,
    submitted: Vec<ReconciledSecret>,
    failures: HashMap<(String, String), Remaining>,
    next_uid: u64,
}

impl State {
    /// Consume one injected failure for `operation` on `target`, if any
    fn take_failure(&mut self, operation: Operation, target: &str) -> Option<StoreError> {
        let slot = (operation.to_string(), target.to_string());
        let remaining = self.failures.get(&slot).copied()?;
        match remaining {
            Remaining::Always => {}
            Remaining::Times(1) => {
                self.failures.remove(&slot);
            }
            Remaining::Times(n) => {
                self.failures.insert(slot, Remaining::Times(n - 1));
            }
        }
        Some(StoreError::Request {
            operation,
            target: target.to_string(),
            source: "injected failure".into(),
        })
    }

    fn mint_uid(&mut self) -> String {
        self.next_uid += 1;
        format!("uid-{}", self.next_uid)
    }
}

#[derive(Debug, Default)]
pub struct FakeSecretStore {
    state: Mutex<State>,
}

impl FakeSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secrets(secrets: impl IntoIterator<Item = LiveSecret>) -> Self {
        let store = Self::new();
        for secret in secrets {
            store.seed(secret);
        }
        store
    }

    pub fn seed(&self, secret: LiveSecret) {
        let mut state = self.state.lock().unwrap();
        state.secrets.insert(secret.key(), secret);
    }

    /// Fail the next call of `operation` on `namespace/name`
    pub fn fail_once(&self, operation: Operation, namespace: &str, name: &str) {
        self.inject(operation, format!("{namespace}/{name}"), Remaining::Times(1));
    }

    /// Fail every call of `operation` on `namespace/name`
    pub fn fail_always(&self, operation: Operation, namespace: &str, name: &str) {
        self.inject(operation, format!("{namespace}/{name}"), Remaining::Always);
    }

    /// Fail every list call for `namespace`
    pub fn fail_list(&self, namespace: &str) {
        self.inject(Operation::List, namespace.to_string(), Remaining::Always);
    }

    fn inject(&self, operation: Operation, target: String, remaining: Remaining) {
        let mut state = self.state.lock().unwrap();
        state
            .failures
            .insert((operation.to_string(), target), remaining);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Objects passed to create and update, in call order
    pub fn submitted(&self) -> Vec<ReconciledSecret> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<LiveSecret> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&SecretKey::new(namespace, name))
            .cloned()
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn list(&self, namespace: &str) -> Result<Vec<LiveSecret>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(namespace.to_string()));
        if let Some(err) = state.take_failure(Operation::List, namespace) {
            return Err(err);
        }
        Ok(state
            .secrets
            .values()
            .filter(|s| s.namespace == namespace)
            .cloned()
            .collect())
    }

    async fn get(&self, namespace: &str, name: &str) -> Result<LiveSecret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Get(namespace.to_string(), name.to_string()));
        if let Some(err) = state.take_failure(Operation::Get, &format!("{namespace}/{name}")) {
            return Err(err);
        }
        let key = SecretKey::new(namespace, name);
        state
            .secrets
            .get(&key)
            .cloned()
            .ok_or(StoreError::NotFound(key))
    }

    async fn create(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Create(namespace.to_string(), secret.name.clone()));
        state.submitted.push(secret.clone());
        let target = format!("{namespace}/{}", secret.name);
        if let Some(err) = state.take_failure(Operation::Create, &target) {
            return Err(err);
        }
        let key = SecretKey::new(namespace, &secret.name);
        if state.secrets.contains_key(&key) || secret.markers.is_some() {
            return Err(StoreError::Request {
                operation: Operation::Create,
                target,
                source: "already exists or carries a uid".into(),
            });
        }
        let created = LiveSecret {
            namespace: namespace.to_string(),
            name: secret.name.clone(),
            labels: secret.labels.clone(),
            annotations: secret.annotations.clone(),
            data: secret.data.clone(),
            secret_type: secret.secret_type.clone(),
            markers: ClusterMarkers {
                uid: state.mint_uid(),
                resource_version: Some("1".to_string()),
                creation_timestamp: None,
            },
        };
        state.secrets.insert(key, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        namespace: &str,
        secret: &ReconciledSecret,
    ) -> Result<LiveSecret, StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Update(namespace.to_string(), secret.name.clone()));
        state.submitted.push(secret.clone());
        let target = format!("{namespace}/{}", secret.name);
        if let Some(err) = state.take_failure(Operation::Update, &target) {
            return Err(err);
        }
        let key = SecretKey::new(namespace, &secret.name);
        let Some(existing) = state.secrets.get(&key).cloned() else {
            return Err(StoreError::NotFound(key));
        };
        if secret.markers.as_ref().map(|m| m.uid.as_str()) != Some(existing.markers.uid.as_str()) {
            return Err(StoreError::Request {
                operation: Operation::Update,
                target,
                source: "uid precondition failed".into(),
            });
        }
        let next_version = existing
            .markers
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let updated = LiveSecret {
            namespace: existing.namespace,
            name: existing.name,
            labels: secret.labels.clone(),
            annotations: secret.annotations.clone(),
            data: secret.data.clone(),
            secret_type: secret.secret_type.clone(),
            markers: ClusterMarkers {
                resource_version: Some(next_version.to_string()),
                ..existing.markers
            },
        };
        state.secrets.insert(key, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Delete(namespace.to_string(), name.to_string()));
        if let Some(err) = state.take_failure(Operation::Delete, &format!("{namespace}/{name}")) {
            return Err(err);
        }
        let key = SecretKey::new(namespace, name);
        state
            .secrets
            .remove(&key)
            .map(|_| ())
            .ok_or(StoreError::NotFound(key))
    }

    async fn patch_metadata(
        &self,
        namespace: &str,
        name: &str,
        labels: &StringMap,
        annotations: &StringMap,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::PatchMetadata(namespace.to_string(), name.to_string()));
        let target = format!("{namespace}/{name}");
        if let Some(err) = state.take_failure(Operation::PatchMetadata, &target) {
            return Err(err);
        }
        let key = SecretKey::new(namespace, name);
        let Some(existing) = state.secrets.get_mut(&key) else {
            return Err(StoreError::NotFound(key));
        };
        existing
            .labels
            .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        existing
            .annotations
            .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

pub fn string_map(entries: &[(&str, &str)]) -> StringMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

pub fn data_map(entries: &[(&str, &str)]) -> DataMap {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect()
}

pub fn template(namespace: &str, name: &str) -> SecretTemplate {
    SecretTemplate {
        namespace: namespace.to_string(),
        name: name.to_string(),
        ..SecretTemplate::default()
    }
}

pub fn live(namespace: &str, name: &str, uid: &str) -> LiveSecret {
    LiveSecret {
        namespace: namespace.to_string(),
        name: name.to_string(),
        labels: StringMap::new(),
        annotations: StringMap::new(),
        data: DataMap::new(),
        secret_type: Some("Opaque".to_string()),
        markers: ClusterMarkers {
            uid: uid.to_string(),
            resource_version: Some("1".to_string()),
            creation_timestamp: None,
        },
    }
}

/// A reconciled secret that matched `live`
pub fn identified(namespace: &str, name: &str, uid: &str) -> ReconciledSecret {
    let live = live(namespace, name, uid);
    ReconciledSecret {
        namespace: live.namespace,
        name: live.name,
        labels: live.labels,
        annotations: live.annotations,
        data: live.data,
        secret_type: live.secret_type,
        markers: Some(live.markers),
    }
}

pub fn unidentified(namespace: &str, name: &str) -> ReconciledSecret {
    ReconciledSecret::from(template(namespace, name))
}

pub fn call(kind: fn(String, String) -> Call, namespace: &str, name: &str) -> Call {
    kind(namespace.to_string(), name.to_string())
}
