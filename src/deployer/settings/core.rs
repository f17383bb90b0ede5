//! Core Settings struct and implementations.

use crate::deployer::artifact::Repository;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Blob store collection parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobStoreSettings {
    /// Collection name
    pub name: String,
    /// Shards used when the collection has to be created
    pub shards: u32,
    /// Replicas used when the collection has to be created
    pub replicas: u32,
}

impl Default for BlobStoreSettings {
    fn default() -> Self {
        Self {
            name: ".system".to_string(),
            shards: 1,
            replicas: 1,
        }
    }
}

/// Main settings for deployment operations.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder).
#[derive(Clone, Debug)]
pub struct Settings {
    /// Base URL of the coordinator admin API, e.g. `http://localhost:8983/solr`.
    coordinator_url: Url,

    /// Artifact repositories, highest priority first.
    repositories: Vec<Repository>,

    /// Upper bound for a single network request.
    request_timeout: Duration,

    /// Upper bound for establishing a connection.
    connect_timeout: Duration,

    /// File name marking the root of a config bundle.
    marker_file: String,

    /// Runtime dependency manifest served by each collection.
    manifest_file: String,

    /// Blob store collection.
    blob_store: BlobStoreSettings,

    /// Directory under which staging directories are created.
    staging_root: PathBuf,
}

impl Settings {
    /// Returns the coordinator base URL.
    pub fn coordinator_url(&self) -> &Url {
        &self.coordinator_url
    }

    /// Returns the repositories in priority order.
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the config-root marker file name.
    pub fn marker_file(&self) -> &str {
        &self.marker_file
    }

    /// Returns the runtime dependency manifest file name.
    pub fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    pub fn blob_store(&self) -> &BlobStoreSettings {
        &self.blob_store
    }

    /// Returns the staging root.
    pub fn staging_root(&self) -> &Path {
        &self.staging_root
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        coordinator_url: Url,
        repositories: Vec<Repository>,
        request_timeout: Duration,
        connect_timeout: Duration,
        marker_file: String,
        manifest_file: String,
        blob_store: BlobStoreSettings,
        staging_root: PathBuf,
    ) -> Self {
        Self {
            coordinator_url,
            repositories,
            request_timeout,
            connect_timeout,
            marker_file,
            manifest_file,
            blob_store,
            staging_root,
        }
    }
}
