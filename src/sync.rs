//! # Sync Pipeline
//!
//! One complete run: parse templates, index their namespaces, snapshot the
//! live secrets once, reconcile, then write back through the store.
//!
//! Nothing is written until parsing, validation and discovery have all
//! succeeded. During the write phase the first failure stops the run and
//! leaves the remaining secrets untouched; nothing already written is rolled back.

use crate::applier::{ApplyError, Applier};
use crate::config::SyncMode;
use crate::maintenance::{patch_metadata_all, PatchError};
use crate::model::SecretTemplate;
use crate::namespaces::template_namespaces;
use crate::parser::{parse_template_dir, ParseError};
use crate::reconciler::{fetch_live_secrets, reconcile_all, validate_unique, DuplicateTemplate};
use crate::store::{SecretStore, StoreError};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    DuplicateTemplate(#[from] DuplicateTemplate),
    #[error("live secret discovery failed")]
    Discovery(#[source] StoreError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Counts for a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub templates: usize,
    pub namespaces: usize,
    pub live: usize,
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
    pub patched: usize,
    /// Metadata mode only: secrets the store reported as absent
    pub missing: usize,
}

/// Run the pipeline over the templates found in `dir`.
#[instrument(skip(store, dir, mode), fields(dir = %dir.display(), mode = mode.as_str()))]
pub async fn run_sync<S>(store: &S, dir: &Path, mode: SyncMode) -> Result<SyncReport, SyncError>
where
    S: SecretStore + ?Sized,
{
    let templates = parse_template_dir(dir)?;
    info!(templates = templates.len(), "Parsed templates");
    sync_templates(store, &templates, mode).await
}

/// Run the pipeline over already-parsed templates.
pub async fn sync_templates<S>(
    store: &S,
    templates: &[SecretTemplate],
    mode: SyncMode,
) -> Result<SyncReport, SyncError>
where
    S: SecretStore + ?Sized,
{
    validate_unique(templates)?;

    let namespaces = template_namespaces(templates);
    let live = fetch_live_secrets(store, &namespaces)
        .await
        .map_err(SyncError::Discovery)?;
    info!(
        namespaces = namespaces.len(),
        live = live.len(),
        "Discovered live secrets"
    );

    let reconciled = reconcile_all(templates, &live);

    let mut report = SyncReport {
        templates: templates.len(),
        namespaces: namespaces.len(),
        live: live.len(),
        ..SyncReport::default()
    };

    match mode {
        SyncMode::Apply => {
            let tally = Applier::new(store).apply_all(&reconciled).await?;
            report.created = tally.created;
            report.updated = tally.updated;
            report.recreated = tally.recreated;
        }
        SyncMode::Metadata => {
            let tally = patch_metadata_all(store, &reconciled).await?;
            report.patched = tally.patched;
            report.missing = tally.missing;
        }
    }

    info!(
        created = report.created,
        updated = report.updated,
        recreated = report.recreated,
        patched = report.patched,
        missing = report.missing,
        "Sync complete"
    );
    Ok(report)
}
