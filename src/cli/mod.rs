//! Command line interface for solr deployer.
//!
//! Settings are layered as defaults, then the settings file, then flags and
//! environment variables. Ctrl-C cancels the running operation.

mod args;
mod commands;

pub use args::{Args, Command};

use crate::deployer::{Repository, Settings, SettingsBuilder, SettingsFile};
use crate::error::Result;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    let settings = load_settings(&args).await?;

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            watcher.cancel();
        }
    });

    commands::execute(&args, settings, &cancel).await
}

/// Builds settings from the optional settings file and the flags.
pub async fn load_settings(args: &Args) -> Result<Settings> {
    let mut builder = SettingsBuilder::new();

    if let Some(path) = &args.config {
        log::debug!("Loading settings from {}", path.display());
        builder = SettingsFile::load(path).await?.apply(builder)?;
    }

    if let Some(coordinator) = &args.coordinator {
        builder = builder.coordinator(coordinator.clone());
    }
    if !args.repositories.is_empty() {
        let repositories = args
            .repositories
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| Repository::parse(r.trim()))
            .collect::<Result<Vec<_>>>()?;
        builder = builder.repositories(repositories);
    }
    if let Some(secs) = args.timeout {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    builder.build()
}
