//! Config bundle installation.
//!
//! A config bundle is a zip artifact named by its coordinate. The real
//! configuration root is the directory holding the marker file; only that
//! directory is uploaded to the coordinator as the config set.

use super::{
    ArtifactResolver, ConfigInstall, Settings, Warning,
    utils::{archive, fs::StagingDir},
};
use crate::coordinator::Coordinator;
use crate::error::{DeployerError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Downloads config bundles and publishes them as named config sets.
#[derive(Clone)]
pub struct ConfigBundleInstaller {
    coordinator: Arc<dyn Coordinator>,
    resolver: ArtifactResolver,
    marker_file: String,
    staging_root: PathBuf,
}

impl ConfigBundleInstaller {
    pub fn new(
        coordinator: Arc<dyn Coordinator>,
        resolver: ArtifactResolver,
        settings: &Settings,
    ) -> Self {
        Self {
            coordinator,
            resolver,
            marker_file: settings.marker_file().to_string(),
            staging_root: settings.staging_root().to_path_buf(),
        }
    }

    /// Makes sure config set `config_name` is deployed.
    ///
    /// Without `force` an already deployed config set is left untouched.
    /// Otherwise the bundle is resolved, extracted, and uploaded, replacing
    /// any existing config set. The staging directory is removed whether or
    /// not the upload succeeds.
    pub async fn ensure_installed(
        &self,
        config_name: &str,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<ConfigInstall> {
        let deployed = self
            .coordinator
            .list_config_sets(cancel)
            .await?
            .contains(config_name);

        if deployed && !force {
            log::debug!("Config set {} already deployed", config_name);
            return Ok(ConfigInstall::default());
        }

        log::info!(
            "Installing config set {}{}",
            config_name,
            if deployed { " (forced)" } else { "" }
        );

        let staging = StagingDir::create(&self.staging_root, config_name).await?;
        let outcome = self
            .install_from(staging.path(), config_name, force, cancel)
            .await;

        let mut warnings = match outcome {
            Ok(warnings) => warnings,
            Err(e) => {
                if let Err(cleanup) = staging.cleanup().await {
                    log::warn!("Could not delete directory: {}", cleanup);
                }
                return Err(e);
            }
        };

        if let Err(cleanup) = staging.cleanup().await {
            log::warn!("Could not delete directory: {}", cleanup);
            if let DeployerError::CleanupFailed { path, reason } = cleanup {
                warnings.push(Warning::CleanupFailed { path, reason });
            }
        }

        log::info!("Config set {} uploaded", config_name);
        Ok(ConfigInstall {
            uploaded: true,
            warnings,
        })
    }

    async fn install_from(
        &self,
        staging: &Path,
        config_name: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<Warning>> {
        let resolved = self.resolver.resolve(config_name, staging, cancel).await?;
        let unzipped = archive::extract_zip(&resolved.path, &staging.join("unzipped")).await?;

        let mut warnings = Vec::new();
        let root = self
            .locate_config_root(config_name, &unzipped, &mut warnings)
            .await?;

        self.coordinator
            .upload_config_set(config_name, &root, overwrite, cancel)
            .await?;
        Ok(warnings)
    }

    /// Parent of the first marker file, in path order.
    async fn locate_config_root(
        &self,
        config_name: &str,
        unzipped: &Path,
        warnings: &mut Vec<Warning>,
    ) -> Result<PathBuf> {
        let candidates = archive::find_marker_parents(unzipped, &self.marker_file).await?;

        let Some(chosen) = candidates.first().cloned() else {
            return Err(DeployerError::ConfigurationInvalid {
                config: config_name.to_string(),
                reason: format!("extracted bundle contains no {}", self.marker_file),
            });
        };

        if candidates.len() > 1 {
            let warning = Warning::AmbiguousConfigRoot {
                config: config_name.to_string(),
                chosen: chosen.clone(),
                candidates: candidates.into_iter().collect(),
            };
            log::warn!("{}", warning);
            warnings.push(warning);
        }

        Ok(chosen)
    }
}
