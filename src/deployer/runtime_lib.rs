//! Runtime library installation and binding.
//!
//! Runtime libraries live as versioned blobs in the blob store collection.
//! Each dependency is handled independently: a failure for one is recorded
//! as a [`Warning`] and the rest carry on.
//!
//! A blob that already exists is reused as-is; the repository is not
//! consulted again for a newer build.

use super::{
    ArtifactCoordinate, ArtifactResolver, DependencyInstall, Settings, Warning,
    utils::fs::StagingDir,
};
use crate::coordinator::{AdminFile, Coordinator, RequestBody, response::Envelope};
use crate::error::{DeployerError, Result};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Version recorded for a freshly uploaded blob.
const INITIAL_BLOB_VERSION: u64 = 1;

/// Path of the collection config endpoint used for runtime lib bindings.
const CONFIG_PATH: &str = "/config";

/// Kind of runtime lib binding request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingAction {
    Add,
    Update,
}

impl BindingAction {
    fn command(self) -> &'static str {
        match self {
            BindingAction::Add => "add-runtimelib",
            BindingAction::Update => "update-runtimelib",
        }
    }

    /// JSON body understood by the collection config endpoint.
    pub fn body(self, blob_name: &str, version: u64) -> serde_json::Value {
        json!({ (self.command()): { "name": blob_name, "version": version } })
    }
}

impl fmt::Display for BindingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Contents of a collection's runtime dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    Present(Vec<String>),
    Missing,
}

/// Installs runtime libraries into the blob store and binds them to collections.
#[derive(Clone)]
pub struct RuntimeLibraryManager {
    coordinator: Arc<dyn Coordinator>,
    resolver: ArtifactResolver,
    blob_store: String,
    manifest_file: String,
    staging_root: PathBuf,
}

impl RuntimeLibraryManager {
    pub fn new(
        coordinator: Arc<dyn Coordinator>,
        resolver: ArtifactResolver,
        settings: &Settings,
    ) -> Self {
        Self {
            coordinator,
            resolver,
            blob_store: settings.blob_store().name.clone(),
            manifest_file: settings.manifest_file().to_string(),
            staging_root: settings.staging_root().to_path_buf(),
        }
    }

    /// Reads the runtime dependency manifest of `collection`.
    ///
    /// One coordinate per line; blank lines and `#` comments are skipped.
    /// Both a not-found answer and a not-found JSON payload served in place
    /// of the file yield [`Manifest::Missing`].
    pub async fn read_manifest(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<Manifest> {
        let content = match self
            .coordinator
            .read_admin_file(collection, &self.manifest_file, cancel)
            .await?
        {
            AdminFile::Found(bytes) => bytes,
            AdminFile::NotFound => return Ok(Manifest::Missing),
        };

        let text = String::from_utf8_lossy(&content);
        if let Ok(envelope) = serde_json::from_str::<Envelope>(text.trim()) {
            if envelope.is_not_found() {
                return Ok(Manifest::Missing);
            }
        }

        Ok(Manifest::Present(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
        ))
    }

    /// Runtime dependency names declared by the config of `collection`.
    ///
    /// A missing manifest is logged and treated as empty.
    pub async fn list_dependencies(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        match self.read_manifest(collection, cancel).await? {
            Manifest::Present(dependencies) => Ok(dependencies),
            Manifest::Missing => {
                log::warn!("{}", Warning::ManifestMissing {
                    collection: collection.to_string(),
                });
                Ok(Vec::new())
            }
        }
    }

    /// Makes sure every dependency has a blob and returns the versions to bind.
    ///
    /// Dependencies that cannot be resolved or uploaded are left out of the
    /// result and reported as warnings. Only cancellation aborts the call.
    pub async fn ensure_dependencies(
        &self,
        collection: &str,
        dependencies: &[String],
        cancel: &CancellationToken,
    ) -> Result<DependencyInstall> {
        let mut install = DependencyInstall::default();
        let mut seen = HashSet::new();

        for dependency in dependencies {
            if !seen.insert(dependency.as_str()) {
                continue;
            }

            match self.version_or_install(dependency, cancel, &mut install.warnings).await {
                Ok((blob_name, version)) => {
                    install.versions.insert(blob_name, version);
                }
                Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
                Err(e) => {
                    log::warn!(
                        "Cannot load runtime dependency {} for {}. This may cause runtime issues: {}",
                        dependency,
                        collection,
                        e
                    );
                    install.warnings.push(Warning::DependencyUnresolved {
                        dependency: dependency.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(install)
    }

    /// Highest stored version of `dependency`, installing version 1 when none exists.
    async fn version_or_install(
        &self,
        dependency: &str,
        cancel: &CancellationToken,
        warnings: &mut Vec<Warning>,
    ) -> Result<(String, u64)> {
        let coordinate = ArtifactCoordinate::parse(dependency)?;
        let blob_name = coordinate.blob_name();

        let existing = self
            .coordinator
            .query_blob_store(&self.blob_store, &blob_name, cancel)
            .await?;
        if let Some(latest) = existing.iter().map(|r| r.version).max() {
            log::debug!("Runtime dependency {} already installed (v{})", blob_name, latest);
            return Ok((blob_name, latest));
        }

        let staging = StagingDir::create(&self.staging_root, &blob_name).await?;
        let uploaded = async {
            let resolved = self
                .resolver
                .resolve(dependency, staging.path(), cancel)
                .await?;
            self.coordinator
                .post_request(
                    &self.blob_store,
                    &format!("/blob/{blob_name}"),
                    RequestBody::File(resolved.path),
                    cancel,
                )
                .await
        }
        .await;

        if let Err(cleanup) = staging.cleanup().await {
            log::warn!("Could not delete directory: {}", cleanup);
            if let DeployerError::CleanupFailed { path, reason } = cleanup {
                warnings.push(Warning::CleanupFailed { path, reason });
            }
        }

        uploaded?;
        log::info!("Uploaded runtime dependency {} as {}", dependency, blob_name);
        Ok((blob_name, INITIAL_BLOB_VERSION))
    }

    /// Binds each blob version to `collection`.
    ///
    /// A rejected add is retried once as an update; a rejected update is
    /// reported and the remaining bindings still proceed. Returns the
    /// bindings that were accepted.
    pub async fn bind_dependencies(
        &self,
        collection: &str,
        versions: &BTreeMap<String, u64>,
        cancel: &CancellationToken,
    ) -> Result<(BTreeMap<String, u64>, Vec<Warning>)> {
        let mut bound = BTreeMap::new();
        let mut warnings = Vec::new();

        for (blob_name, &version) in versions {
            match self
                .bind(collection, blob_name, version, BindingAction::Add, cancel)
                .await
            {
                Ok(()) => {
                    bound.insert(blob_name.clone(), version);
                    continue;
                }
                Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
                Err(e) => {
                    log::warn!(
                        "Cannot add runtime dependency {} (v{}) to collection {}: {}",
                        blob_name,
                        version,
                        collection,
                        e
                    );
                    log::info!("Try to update dependency {}", blob_name);
                }
            }

            match self
                .bind(collection, blob_name, version, BindingAction::Update, cancel)
                .await
            {
                Ok(()) => {
                    bound.insert(blob_name.clone(), version);
                }
                Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
                Err(e) => {
                    let warning = Warning::BindingFailed {
                        blob_name: blob_name.clone(),
                        version,
                        reason: e.to_string(),
                    };
                    log::warn!("Collection {}: {}", collection, warning);
                    warnings.push(warning);
                }
            }
        }

        Ok((bound, warnings))
    }

    async fn bind(
        &self,
        collection: &str,
        blob_name: &str,
        version: u64,
        action: BindingAction,
        cancel: &CancellationToken,
    ) -> Result<()> {
        log::debug!("{} {} (v{}) on {}", action, blob_name, version, collection);
        self.coordinator
            .post_request(
                collection,
                CONFIG_PATH,
                RequestBody::Json(action.body(blob_name, version)),
                cancel,
            )
            .await
    }
}
