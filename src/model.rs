//! # Secret Model
//!
//! The three shapes a secret takes during a run:
//!
//! - [`SecretTemplate`]: what source control declares
//! - [`LiveSecret`]: what the cluster currently stores, including controller-written `data`
//! - [`ReconciledSecret`]: what is actually submitted back to the cluster
//!
//! Conversions to and from `k8s_openapi` [`Secret`] live here so the rest of the
//! crate never touches raw `ObjectMeta`.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::ByteString;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::constants::DEFAULT_NAMESPACE;

/// Label and annotation maps
pub type StringMap = BTreeMap<String, String>;

/// Secret payload
pub type DataMap = BTreeMap<String, ByteString>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("secret has no metadata.name")]
    MissingName,
    #[error("secret {0} has no metadata.uid")]
    MissingUid(SecretKey),
}

/// Matching key for templates and live objects
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretKey {
    pub namespace: String,
    pub name: String,
}

impl SecretKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Source-controlled declaration of a secret's identity and metadata.
/// `data` is usually empty; an in-cluster agent fills it after the first apply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretTemplate {
    pub namespace: String,
    pub name: String,
    pub labels: StringMap,
    pub annotations: StringMap,
    pub data: DataMap,
    /// `type` field, e.g. `Opaque` or `kubernetes.io/tls`
    pub secret_type: Option<String>,
}

impl SecretTemplate {
    #[must_use]
    pub fn key(&self) -> SecretKey {
        SecretKey::new(&self.namespace, &self.name)
    }

    /// Build a template from a decoded manifest.
    ///
    /// `stringData` entries are folded into `data` and win on key collision,
    /// the same way the API server treats them on write.
    pub fn from_manifest(secret: Secret) -> Result<Self, ModelError> {
        let ObjectMeta {
            name,
            namespace,
            labels,
            annotations,
            ..
        } = secret.metadata;

        let name = name.filter(|n| !n.is_empty()).ok_or(ModelError::MissingName)?;
        let namespace = namespace
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let mut data = secret.data.unwrap_or_default();
        for (key, value) in secret.string_data.unwrap_or_default() {
            data.insert(key, ByteString(value.into_bytes()));
        }

        Ok(Self {
            namespace,
            name,
            labels: labels.unwrap_or_default(),
            annotations: annotations.unwrap_or_default(),
            data,
            secret_type: secret.type_,
        })
    }
}

/// Markers the cluster assigns to an object that exists.
///
/// Presence of markers is what makes the applier choose update over create.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMarkers {
    /// Identity token (`metadata.uid`)
    pub uid: String,
    pub resource_version: Option<String>,
    pub creation_timestamp: Option<Time>,
}

/// A secret as currently stored by the cluster
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSecret {
    pub namespace: String,
    pub name: String,
    pub labels: StringMap,
    pub annotations: StringMap,
    pub data: DataMap,
    pub secret_type: Option<String>,
    pub markers: ClusterMarkers,
}

impl LiveSecret {
    #[must_use]
    pub fn key(&self) -> SecretKey {
        SecretKey::new(&self.namespace, &self.name)
    }

    /// Convert an API response object. `namespace` is used when the response
    /// omits `metadata.namespace`.
    pub fn from_api(secret: Secret, namespace: &str) -> Result<Self, ModelError> {
        let ObjectMeta {
            name,
            namespace: object_namespace,
            labels,
            annotations,
            uid,
            resource_version,
            creation_timestamp,
            ..
        } = secret.metadata;

        let name = name.ok_or(ModelError::MissingName)?;
        let namespace = object_namespace.unwrap_or_else(|| namespace.to_string());
        let uid = uid.ok_or_else(|| ModelError::MissingUid(SecretKey::new(&namespace, &name)))?;

        Ok(Self {
            namespace,
            name,
            labels: labels.unwrap_or_default(),
            annotations: annotations.unwrap_or_default(),
            data: secret.data.unwrap_or_default(),
            secret_type: secret.type_,
            markers: ClusterMarkers {
                uid,
                resource_version,
                creation_timestamp,
            },
        })
    }
}

/// The object submitted to the cluster for one template
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSecret {
    pub namespace: String,
    pub name: String,
    pub labels: StringMap,
    pub annotations: StringMap,
    pub data: DataMap,
    pub secret_type: Option<String>,
    /// `Some` when a live counterpart was matched; `None` signals creation
    pub markers: Option<ClusterMarkers>,
}

impl ReconciledSecret {
    #[must_use]
    pub fn key(&self) -> SecretKey {
        SecretKey::new(&self.namespace, &self.name)
    }

    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.markers.is_some()
    }

    /// Copy with identity, version and creation timestamp cleared, ready to be
    /// submitted as a brand new object.
    #[must_use]
    pub fn without_markers(&self) -> Self {
        Self {
            markers: None,
            ..self.clone()
        }
    }

    /// Render as a Kubernetes object for create/replace calls
    #[must_use]
    pub fn to_secret(&self) -> Secret {
        let (uid, resource_version, creation_timestamp) = match &self.markers {
            Some(m) => (
                Some(m.uid.clone()),
                m.resource_version.clone(),
                m.creation_timestamp.clone(),
            ),
            None => (None, None, None),
        };

        Secret {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                namespace: Some(self.namespace.clone()),
                labels: non_empty(&self.labels),
                annotations: non_empty(&self.annotations),
                uid,
                resource_version,
                creation_timestamp,
                ..ObjectMeta::default()
            },
            data: non_empty(&self.data),
            type_: self.secret_type.clone(),
            ..Secret::default()
        }
    }
}

impl From<SecretTemplate> for ReconciledSecret {
    fn from(template: SecretTemplate) -> Self {
        Self {
            namespace: template.namespace,
            name: template.name,
            labels: template.labels,
            annotations: template.annotations,
            data: template.data,
            secret_type: template.secret_type,
            markers: None,
        }
    }
}

fn non_empty<V: Clone>(map: &BTreeMap<String, V>) -> Option<BTreeMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}
