//! # Prelude
//!
//! Re-exports the types most callers need:
//!
//! ```rust
//! use secret_template_sync::prelude::*;
//! ```

pub use crate::applier::{ApplyError, ApplyOutcome, Applier, RecreateError};
pub use crate::config::{SyncConfig, SyncMode};
pub use crate::model::{
    ClusterMarkers, LiveSecret, ReconciledSecret, SecretKey, SecretTemplate, StringMap,
};
pub use crate::store::{KubeSecretStore, SecretStore, StoreError};
pub use crate::sync::{run_sync, sync_templates, SyncError, SyncReport};
