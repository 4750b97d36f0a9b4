//! # secret-template-sync
//!
//! One-shot binary: reads the template directory from `SECRETS_DIR` (or the
//! first argument), connects using the standard kubeconfig resolution, and
//! reconciles every template. Any failure exits non-zero.
//!
//! ```bash
//! SECRETS_DIR=./deploy/secrets secret-template-sync
//! SYNC_MODE=metadata secret-template-sync ./deploy/secrets
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use kube::Client;
use secret_template_sync::config::SyncConfig;
use secret_template_sync::observability::init_tracing;
use secret_template_sync::store::KubeSecretStore;
use secret_template_sync::sync::run_sync;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Apply Secret templates without overwriting controller-written data
#[derive(Debug, Parser)]
#[command(name = "secret-template-sync", version, long_about = None)]
struct Cli {
    /// Template directory, used when SECRETS_DIR is not set
    #[arg(value_name = "DIR")]
    secrets_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = SyncConfig::from_env(cli.secrets_dir).context("Invalid configuration")?;
    init_tracing(&config)?;

    info!(
        git_hash = env!("BUILD_GIT_HASH"),
        built = env!("BUILD_DATETIME"),
        dir = %config.secrets_dir.display(),
        mode = config.mode.as_str(),
        "Starting secret-template-sync"
    );

    // Required for rustls 0.23+ before the kube client opens a connection
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let store = KubeSecretStore::new(client);

    match run_sync(&store, &config.secrets_dir, config.mode).await {
        Ok(report) => {
            info!(?report, "Done");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Sync failed");
            Err(e).with_context(|| {
                format!(
                    "Failed to sync templates from {}",
                    config.secrets_dir.display()
                )
            })
        }
    }
}
