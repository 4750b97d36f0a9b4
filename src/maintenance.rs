//! # Metadata Maintenance
//!
//! Label and annotation sync that never creates, deletes or touches `data`.
//! A secret that has disappeared is skipped rather than treated as a failure.

use crate::model::{ReconciledSecret, SecretKey};
use crate::store::{SecretStore, StoreError};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("failed to patch metadata of secret {key}: {source}")]
pub struct PatchError {
    pub key: SecretKey,
    #[source]
    pub source: StoreError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    /// The store reported the secret as absent
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchTally {
    pub patched: usize,
    pub missing: usize,
}

pub async fn patch_metadata<S>(
    store: &S,
    secret: &ReconciledSecret,
) -> Result<PatchOutcome, PatchError>
where
    S: SecretStore + ?Sized,
{
    let key = secret.key();
    match store
        .patch_metadata(
            &secret.namespace,
            &secret.name,
            &secret.labels,
            &secret.annotations,
        )
        .await
    {
        Ok(()) => {
            info!(secret = %key, "Patched secret metadata");
            Ok(PatchOutcome::Patched)
        }
        Err(e) if e.is_not_found() => {
            info!(secret = %key, "Secret not found, skipping metadata patch");
            Ok(PatchOutcome::Missing)
        }
        Err(source) => Err(PatchError { key, source }),
    }
}

/// Patch every secret in order, stopping at the first failure.
pub async fn patch_metadata_all<S>(
    store: &S,
    secrets: &[ReconciledSecret],
) -> Result<PatchTally, PatchError>
where
    S: SecretStore + ?Sized,
{
    let mut tally = PatchTally::default();
    for secret in secrets {
        match patch_metadata(store, secret).await? {
            PatchOutcome::Patched => tally.patched += 1,
            PatchOutcome::Missing => tally.missing += 1,
        }
    }
    Ok(tally)
}
