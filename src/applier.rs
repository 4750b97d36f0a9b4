//! # Applier
//!
//! Writes reconciled secrets to the store, one at a time, in order.
//!
//! ```text
//! unidentified ── create ──ok──> Created
//!                    └─err──> recreate
//! identified ──── update ──ok──> Updated
//!                    └─err──> recreate
//! recreate: get ──absent──> error
//!            └─present──> delete ──> create (markers cleared) ──> Recreated
//! ```
//!
//! An unidentified secret found by the get was created after the live
//! snapshot. It is recreated with its live data and metadata merged in, the
//! same way a snapshot match would have been.
//!
//! Some changes (a new `type`, an immutable secret) are refused as in-place
//! updates, and delete-then-create is how those get through. The object does
//! not exist between the two calls.

use crate::model::{LiveSecret, ReconciledSecret, SecretKey};
use crate::reconciler::merge_metadata;
use crate::store::{Operation, SecretStore, StoreError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// How a single secret ended up in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Recreated,
}

impl ApplyOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Updated => "updated",
            ApplyOutcome::Recreated => "recreated",
        }
    }
}

/// Failure of one step of the delete-then-create fallback
#[derive(Debug, Error)]
pub enum RecreateError {
    #[error("existence check for {key} failed: {source}")]
    ExistenceCheck {
        key: SecretKey,
        #[source]
        source: StoreError,
    },
    #[error("{0} does not exist, nothing to recreate")]
    Missing(SecretKey),
    #[error("failed to delete {key} before recreating it: {source}")]
    Delete {
        key: SecretKey,
        #[source]
        source: StoreError,
    },
    /// The object is gone from the cluster together with its data
    #[error("{key} was deleted but could not be created again: {source}")]
    CreateAfterDelete {
        key: SecretKey,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
#[error("failed to apply secret {key}: {operation} was refused ({cause}) and recreate failed")]
pub struct ApplyError {
    pub key: SecretKey,
    /// The call whose failure started the recreate fallback
    pub operation: Operation,
    pub cause: StoreError,
    #[source]
    pub source: RecreateError,
}

/// Per-outcome counts for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyTally {
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
}

impl ApplyTally {
    fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Updated => self.updated += 1,
            ApplyOutcome::Recreated => self.recreated += 1,
        }
    }
}

pub struct Applier<'a, S: ?Sized> {
    store: &'a S,
}

impl<S: ?Sized> std::fmt::Debug for Applier<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Applier").finish_non_exhaustive()
    }
}

impl<'a, S> Applier<'a, S>
where
    S: SecretStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Apply every secret in order, stopping at the first failure.
    /// Secrets already applied are left as they are.
    pub async fn apply_all(&self, secrets: &[ReconciledSecret]) -> Result<ApplyTally, ApplyError> {
        let mut tally = ApplyTally::default();
        for secret in secrets {
            let outcome = self.apply(secret).await?;
            tally.record(outcome);
        }
        Ok(tally)
    }

    pub async fn apply(&self, secret: &ReconciledSecret) -> Result<ApplyOutcome, ApplyError> {
        let key = secret.key();

        let (operation, result) = if secret.is_identified() {
            (
                Operation::Update,
                self.store.update(&secret.namespace, secret).await,
            )
        } else {
            (
                Operation::Create,
                self.store.create(&secret.namespace, secret).await,
            )
        };

        let cause = match result {
            Ok(_) => {
                let outcome = if operation == Operation::Update {
                    ApplyOutcome::Updated
                } else {
                    ApplyOutcome::Created
                };
                info!(secret = %key, outcome = outcome.as_str(), "Applied secret");
                return Ok(outcome);
            }
            Err(e) => e,
        };

        warn!(
            secret = %key,
            operation = %operation,
            error = %cause,
            "Apply refused, falling back to delete and recreate"
        );

        match self.recreate(secret).await {
            Ok(_) => {
                info!(
                    secret = %key,
                    outcome = ApplyOutcome::Recreated.as_str(),
                    "Applied secret"
                );
                Ok(ApplyOutcome::Recreated)
            }
            Err(source) => Err(ApplyError {
                key,
                operation,
                cause,
                source,
            }),
        }
    }

    /// Delete `secret` and create it again with its markers cleared.
    ///
    /// Each step reports its own error. A failure after the delete leaves the
    /// secret absent from the cluster.
    pub async fn recreate(&self, secret: &ReconciledSecret) -> Result<LiveSecret, RecreateError> {
        let key = secret.key();

        let live = match self.store.get(&secret.namespace, &secret.name).await {
            Ok(live) => live,
            Err(e) if e.is_not_found() => return Err(RecreateError::Missing(key)),
            Err(source) => return Err(RecreateError::ExistenceCheck { key, source }),
        };

        let fresh = if secret.is_identified() {
            secret.without_markers()
        } else {
            // Appeared after the snapshot: its data is kept like any matched secret
            debug!(secret = %key, "Secret exists but was not in the snapshot, keeping its data");
            adopt_live(secret, &live)
        };

        self.store
            .delete(&secret.namespace, &secret.name)
            .await
            .map_err(|source| RecreateError::Delete {
                key: key.clone(),
                source,
            })?;

        self.store
            .create(&secret.namespace, &fresh)
            .await
            .map_err(|source| {
                error!(
                    secret = %key,
                    error = %source,
                    "Secret deleted but not recreated; its data is no longer in the cluster"
                );
                RecreateError::CreateAfterDelete {
                    key: key.clone(),
                    source,
                }
            })
    }
}

/// Merge `live` into an unidentified `secret`, leaving markers cleared
fn adopt_live(secret: &ReconciledSecret, live: &LiveSecret) -> ReconciledSecret {
    ReconciledSecret {
        namespace: secret.namespace.clone(),
        name: secret.name.clone(),
        labels: merge_metadata(&live.labels, &secret.labels),
        annotations: merge_metadata(&live.annotations, &secret.annotations),
        data: live.data.clone(),
        secret_type: secret
            .secret_type
            .clone()
            .or_else(|| live.secret_type.clone()),
        markers: None,
    }
}
