//! Collection create/update workflow.
//!
//! This module provides the [`CollectionOrchestrator`] that keeps a
//! collection, its config set, and its runtime libraries consistent.
//!
//! Steps run strictly in order and completed steps are never rolled back:
//!
//! - create: install config, create collection, reconcile runtime libs
//! - update: read current config name; make sure the config set is
//!   installed (forced when the name differs), then link and reload only on
//!   a change; then reconcile runtime libs
//!
//! Runtime lib reconciliation is best-effort; its failures end up in
//! [`DeploymentReport::warnings`].
//!
//! Two orchestrators working on the same collection concurrently are not
//! coordinated; callers must serialize per collection.

use super::{
    ArtifactResolver, ConfigBundleInstaller, DeploymentReport, Manifest, RuntimeLibraryManager,
    Settings, Warning, utils::http,
};
use crate::coordinator::{Coordinator, CollectionSpec, SolrCoordinator};
use crate::error::{DeployerError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Top-level deployment workflow against one coordinator.
pub struct CollectionOrchestrator {
    coordinator: Arc<dyn Coordinator>,
    resolver: ArtifactResolver,
    config_sets: ConfigBundleInstaller,
    runtime_libs: RuntimeLibraryManager,
    settings: Settings,
}

impl std::fmt::Debug for CollectionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionOrchestrator")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CollectionOrchestrator {
    /// Creates an orchestrator talking to the Solr coordinator named in `settings`.
    ///
    /// A single HTTP client is shared by the coordinator and the resolver.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let client = http::build_client(settings.connect_timeout(), settings.request_timeout())?;
        let coordinator = Arc::new(SolrCoordinator::new(
            client.clone(),
            settings.coordinator_url().clone(),
        ));
        Ok(Self::new(settings, coordinator, client))
    }

    /// Creates an orchestrator over an explicit coordinator and HTTP client.
    pub fn new(
        settings: Settings,
        coordinator: Arc<dyn Coordinator>,
        client: reqwest::Client,
    ) -> Self {
        let resolver = ArtifactResolver::new(client, settings.repositories().to_vec());
        let config_sets =
            ConfigBundleInstaller::new(coordinator.clone(), resolver.clone(), &settings);
        let runtime_libs =
            RuntimeLibraryManager::new(coordinator.clone(), resolver.clone(), &settings);

        Self {
            coordinator,
            resolver,
            config_sets,
            runtime_libs,
            settings,
        }
    }

    /// Creates the orchestrator and makes sure the blob store exists.
    pub async fn connect(
        settings: Settings,
        coordinator: Arc<dyn Coordinator>,
        client: reqwest::Client,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let orchestrator = Self::new(settings, coordinator, client);
        orchestrator.ensure_blob_store(cancel).await?;
        Ok(orchestrator)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &ArtifactResolver {
        &self.resolver
    }

    pub fn config_sets(&self) -> &ConfigBundleInstaller {
        &self.config_sets
    }

    pub fn runtime_libs(&self) -> &RuntimeLibraryManager {
        &self.runtime_libs
    }

    /// Creates the blob store collection when the cluster has none.
    ///
    /// Returns true when the collection had to be created.
    pub async fn ensure_blob_store(&self, cancel: &CancellationToken) -> Result<bool> {
        let blob_store = self.settings.blob_store();
        let status = self.coordinator.cluster_status(None, cancel).await?;
        if !status.success {
            return Err(DeployerError::CoordinatorUnavailable {
                operation: "CLUSTERSTATUS".to_string(),
                reason: "cluster status did not report success".to_string(),
            });
        }
        if status.collections.contains_key(&blob_store.name) {
            return Ok(false);
        }

        log::warn!(
            "Blob store '{}' for runtime libs is not yet created. Will create one",
            blob_store.name
        );
        let spec = CollectionSpec {
            name: blob_store.name.clone(),
            config_name: None,
            num_shards: blob_store.shards,
            num_replicas: blob_store.replicas,
        };
        self.coordinator
            .create_collection(&spec, cancel)
            .await
            .map_err(|e| match e {
                DeployerError::Cancelled => DeployerError::Cancelled,
                other => DeployerError::CoordinatorUnavailable {
                    operation: format!("create blob store {}", spec.name),
                    reason: format!("Blob store is not available and cannot be created: {other}"),
                },
            })?;

        log::info!("Blob store has been created successfully");
        Ok(true)
    }

    /// Whether the coordinator knows `collection`.
    pub async fn collection_exists(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        Ok(self
            .coordinator
            .list_collections(cancel)
            .await?
            .contains(collection))
    }

    /// Creates `collection` bound to `config_name`.
    ///
    /// The config set is installed first if needed. Coordinator refusal
    /// fails with [`DeployerError::CollectionCreateFailed`]; runtime lib
    /// problems only produce warnings.
    pub async fn create_collection(
        &self,
        collection: &str,
        config_name: &str,
        num_shards: u32,
        num_replicas: u32,
        cancel: &CancellationToken,
    ) -> Result<DeploymentReport> {
        let install = self
            .config_sets
            .ensure_installed(config_name, false, cancel)
            .await?;

        let spec = CollectionSpec {
            name: collection.to_string(),
            config_name: Some(config_name.to_string()),
            num_shards,
            num_replicas,
        };
        log::info!(
            "Creating collection {} with config {} ({} shards x {} replicas)",
            collection,
            config_name,
            num_shards,
            num_replicas
        );
        self.coordinator
            .create_collection(&spec, cancel)
            .await
            .map_err(|e| match e {
                DeployerError::Cancelled => DeployerError::Cancelled,
                other => DeployerError::CollectionCreateFailed {
                    collection: collection.to_string(),
                    reason: other.to_string(),
                },
            })?;

        let mut report = DeploymentReport {
            collection: collection.to_string(),
            config_name: config_name.to_string(),
            config_changed: true,
            warnings: install.warnings,
            ..Default::default()
        };
        self.reconcile_into(&mut report, cancel).await?;
        Ok(report)
    }

    /// Switches `collection` to `config_name` when it differs from the current one.
    ///
    /// An unchanged config name only reinstalls the config set when the
    /// coordinator lost it, and never links or reloads. A failed reload
    /// after a switch is fatal.
    pub async fn update_collection(
        &self,
        collection: &str,
        config_name: &str,
        cancel: &CancellationToken,
    ) -> Result<DeploymentReport> {
        let current = self.current_config_name(collection, cancel).await?;
        let changed = current.as_deref() != Some(config_name);

        let mut report = DeploymentReport {
            collection: collection.to_string(),
            config_name: config_name.to_string(),
            config_changed: changed,
            ..Default::default()
        };

        if changed {
            log::info!(
                "Switching collection {} from config {} to {}",
                collection,
                current.as_deref().unwrap_or("<none>"),
                config_name
            );
            let install = self
                .config_sets
                .ensure_installed(config_name, true, cancel)
                .await?;
            report.warnings.extend(install.warnings);

            self.coordinator
                .link_config_set(collection, config_name, cancel)
                .await?;

            self.coordinator
                .reload_collection(collection, cancel)
                .await
                .map_err(|e| match e {
                    DeployerError::Cancelled => DeployerError::Cancelled,
                    other => DeployerError::ReloadFailed {
                        collection: collection.to_string(),
                        reason: other.to_string(),
                    },
                })?;
        } else {
            log::info!("Collection {} already uses config {}", collection, config_name);
            let install = self
                .config_sets
                .ensure_installed(config_name, false, cancel)
                .await?;
            report.warnings.extend(install.warnings);
        }

        self.reconcile_into(&mut report, cancel).await?;
        Ok(report)
    }

    /// Creates the collection when absent, otherwise updates it.
    pub async fn create_or_update(
        &self,
        collection: &str,
        config_name: &str,
        num_shards: u32,
        num_replicas: u32,
        cancel: &CancellationToken,
    ) -> Result<DeploymentReport> {
        if self.collection_exists(collection, cancel).await? {
            self.update_collection(collection, config_name, cancel).await
        } else {
            self.create_collection(collection, config_name, num_shards, num_replicas, cancel)
                .await
        }
    }

    /// Installs and binds the runtime libs declared by the collection's config.
    pub async fn ensure_dependencies(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<(BTreeMap<String, u64>, Vec<Warning>)> {
        let mut warnings = Vec::new();

        let dependencies = match self.runtime_libs.read_manifest(collection, cancel).await {
            Ok(Manifest::Present(dependencies)) => dependencies,
            Ok(Manifest::Missing) => {
                let warning = Warning::ManifestMissing {
                    collection: collection.to_string(),
                };
                log::warn!("{}", warning);
                warnings.push(warning);
                Vec::new()
            }
            Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
            Err(e) => {
                let warning = Warning::ManifestUnreadable {
                    collection: collection.to_string(),
                    reason: e.to_string(),
                };
                log::warn!("{}", warning);
                warnings.push(warning);
                Vec::new()
            }
        };

        if dependencies.is_empty() {
            return Ok((BTreeMap::new(), warnings));
        }

        let install = self
            .runtime_libs
            .ensure_dependencies(collection, &dependencies, cancel)
            .await?;
        warnings.extend(install.warnings);

        let (bound, binding_warnings) = self
            .runtime_libs
            .bind_dependencies(collection, &install.versions, cancel)
            .await?;
        warnings.extend(binding_warnings);

        Ok((bound, warnings))
    }

    /// Deletes `collection`; absent collections are left alone.
    pub async fn remove_collection(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        if !self.collection_exists(collection, cancel).await? {
            log::info!("Collection {} does not exist, nothing to remove", collection);
            return Ok(false);
        }
        self.coordinator.delete_collection(collection, cancel).await?;
        log::info!("Removed collection {}", collection);
        Ok(true)
    }

    /// Deletes config set `config_name`; absent config sets are left alone.
    pub async fn remove_config_set(
        &self,
        config_name: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        if !self
            .coordinator
            .list_config_sets(cancel)
            .await?
            .contains(config_name)
        {
            log::info!("Config set {} does not exist, nothing to remove", config_name);
            return Ok(false);
        }
        self.coordinator
            .delete_config_set(config_name, cancel)
            .await?;
        log::info!("Removed config set {}", config_name);
        Ok(true)
    }

    async fn current_config_name(
        &self,
        collection: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let status = match self.coordinator.cluster_status(Some(collection), cancel).await {
            Ok(status) => status,
            Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
            Err(e) => {
                return Err(DeployerError::StatusUnavailable {
                    collection: collection.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !status.success {
            return Err(DeployerError::StatusUnavailable {
                collection: collection.to_string(),
                reason: "cluster status did not report success".to_string(),
            });
        }

        status
            .collections
            .get(collection)
            .map(|c| c.config_name.clone())
            .ok_or_else(|| DeployerError::CollectionNotFound {
                collection: collection.to_string(),
            })
    }

    async fn reconcile_into(
        &self,
        report: &mut DeploymentReport,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (bound, warnings) = self.ensure_dependencies(&report.collection, cancel).await?;
        report.dependencies = bound;
        report.warnings.extend(warnings);
        Ok(())
    }
}
