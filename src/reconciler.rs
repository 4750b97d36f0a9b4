//! # Reconciler
//!
//! Pairs each template with its live counterpart and merges the two.
//!
//! Precedence when a live secret with the same `(namespace, name)` exists:
//!
//! - `labels` / `annotations`: union of both maps, the template's value wins on collision
//! - `data`: always the live object's, whatever the template declares
//! - markers (`uid`, `resourceVersion`, `creationTimestamp`): the live object's
//! - `type`: the template's when declared, otherwise the live object's
//!
//! Without a match the template is passed through unchanged and carries no
//! markers, which routes it to creation.

use crate::model::{LiveSecret, ReconciledSecret, SecretKey, SecretTemplate, StringMap};
use crate::store::{SecretStore, StoreError};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("more than one template declares secret {0}")]
pub struct DuplicateTemplate(pub SecretKey);

/// Reject template sets that declare the same `(namespace, name)` twice.
pub fn validate_unique(templates: &[SecretTemplate]) -> Result<(), DuplicateTemplate> {
    let mut seen = HashSet::new();
    for template in templates {
        let key = template.key();
        if !seen.insert(key.clone()) {
            return Err(DuplicateTemplate(key));
        }
    }
    Ok(())
}

/// Snapshot the live secrets of every namespace, one list call each, in order.
///
/// # Errors
///
/// The first failing list call aborts discovery.
#[instrument(skip(store, namespaces), fields(namespaces = namespaces.len()))]
pub async fn fetch_live_secrets<S>(
    store: &S,
    namespaces: &[String],
) -> Result<Vec<LiveSecret>, StoreError>
where
    S: SecretStore + ?Sized,
{
    let mut live = Vec::new();
    for namespace in namespaces {
        let secrets = store.list(namespace).await?;
        info!(namespace = %namespace, count = secrets.len(), "Fetched live secrets");
        live.extend(secrets);
    }
    Ok(live)
}

/// Union of `live` and `template`, template entries overriding.
/// Always allocates; neither input is modified.
#[must_use]
pub fn merge_metadata(live: &StringMap, template: &StringMap) -> StringMap {
    let mut merged = live.clone();
    merged.extend(template.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// First live secret with the template's `(namespace, name)`
#[must_use]
pub fn find_live<'a>(template: &SecretTemplate, live: &'a [LiveSecret]) -> Option<&'a LiveSecret> {
    live.iter()
        .find(|l| l.namespace == template.namespace && l.name == template.name)
}

#[must_use]
pub fn reconcile_secret(template: &SecretTemplate, live: Option<&LiveSecret>) -> ReconciledSecret {
    let Some(live) = live else {
        return ReconciledSecret::from(template.clone());
    };

    ReconciledSecret {
        namespace: template.namespace.clone(),
        name: template.name.clone(),
        labels: merge_metadata(&live.labels, &template.labels),
        annotations: merge_metadata(&live.annotations, &template.annotations),
        data: live.data.clone(),
        secret_type: template
            .secret_type
            .clone()
            .or_else(|| live.secret_type.clone()),
        markers: Some(live.markers.clone()),
    }
}

/// One reconciled secret per template, in template order
#[must_use]
pub fn reconcile_all(templates: &[SecretTemplate], live: &[LiveSecret]) -> Vec<ReconciledSecret> {
    templates
        .iter()
        .map(|template| {
            let matched = find_live(template, live);
            debug!(
                secret = %template.key(),
                matched = matched.is_some(),
                "Reconciled template"
            );
            reconcile_secret(template, matched)
        })
        .collect()
}
