//! # Secret Template Sync
//!
//! Applies source-controlled Kubernetes Secret templates to a cluster without
//! destroying payload that an in-cluster controller has written since.
//!
//! Templates usually declare a secret's identity and metadata with empty
//! `data`; an agent in the cluster fills the payload in later. Re-applying the
//! template verbatim would wipe it. Each run therefore:
//!
//! 1. **Parses** every `v1/Secret` document in a template directory ([`parser`])
//! 2. **Indexes** the namespaces those templates target ([`namespaces`])
//! 3. **Snapshots** the live secrets of each namespace ([`reconciler::fetch_live_secrets`])
//! 4. **Reconciles** template and live object: template metadata wins, live `data` is kept ([`reconciler`])
//! 5. **Applies** the result with create / update / delete-and-recreate ([`applier`]),
//!    or only patches labels and annotations in metadata mode ([`maintenance`])
//!
//! The run is one-shot and sequential. All cluster access goes through the
//! [`store::SecretStore`] trait so the pipeline can be driven by an in-memory store.

pub mod applier;
pub mod config;
pub mod constants;
pub mod maintenance;
pub mod model;
pub mod namespaces;
pub mod observability;
pub mod parser;
pub mod prelude;
pub mod reconciler;
pub mod store;
pub mod sync;
