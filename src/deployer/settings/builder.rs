//! Builder for constructing Settings.

use super::{BlobStoreSettings, Settings};
use crate::deployer::artifact::Repository;
use crate::error::{DeployerError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default coordinator endpoint.
pub const DEFAULT_COORDINATOR: &str = "http://localhost:8983/solr";

/// Default marker of a configuration root inside a config bundle.
pub const DEFAULT_MARKER_FILE: &str = "solrconfig.xml";

/// Default runtime dependency manifest name.
pub const DEFAULT_MANIFEST_FILE: &str = "runtimelibs.txt";

/// Builder for constructing [`Settings`].
///
/// # Examples
///
/// ```no_run
/// use solr_deployer::deployer::{Repository, SettingsBuilder};
///
/// # fn example() -> solr_deployer::Result<()> {
/// let settings = SettingsBuilder::new()
///     .coordinator("http://solr-1:8983/solr")
///     .repository(Repository::parse("https://repo1.maven.org/maven2")?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    coordinator: Option<String>,
    repositories: Vec<Repository>,
    request_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    marker_file: Option<String>,
    manifest_file: Option<String>,
    blob_store: BlobStoreSettings,
    staging_root: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the coordinator base URL.
    ///
    /// Default: `http://localhost:8983/solr`
    pub fn coordinator(mut self, url: impl Into<String>) -> Self {
        self.coordinator = Some(url.into());
        self
    }

    /// Appends a repository with the lowest priority so far.
    pub fn repository(mut self, repository: Repository) -> Self {
        self.repositories.push(repository);
        self
    }

    /// Replaces the repository list.
    pub fn repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.repositories = repositories;
        self
    }

    /// Default: 60 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Default: `solrconfig.xml`
    pub fn marker_file(mut self, name: impl Into<String>) -> Self {
        self.marker_file = Some(name.into());
        self
    }

    /// Default: `runtimelibs.txt`
    pub fn manifest_file(mut self, name: impl Into<String>) -> Self {
        self.manifest_file = Some(name.into());
        self
    }

    /// Default: `.system` with one shard and one replica
    pub fn blob_store(mut self, blob_store: BlobStoreSettings) -> Self {
        self.blob_store = blob_store;
        self
    }

    /// Default: the system temporary directory
    pub fn staging_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.staging_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinator URL does not parse or a file name
    /// setting is empty.
    pub fn build(self) -> Result<Settings> {
        let raw = self
            .coordinator
            .unwrap_or_else(|| DEFAULT_COORDINATOR.to_string());
        let coordinator_url = Url::parse(raw.trim_end_matches('/')).map_err(|e| {
            DeployerError::InvalidSettings {
                reason: format!("Invalid coordinator URL '{raw}': {e}"),
            }
        })?;

        let marker_file = self
            .marker_file
            .unwrap_or_else(|| DEFAULT_MARKER_FILE.to_string());
        let manifest_file = self
            .manifest_file
            .unwrap_or_else(|| DEFAULT_MANIFEST_FILE.to_string());
        for (field, value) in [("marker_file", &marker_file), ("manifest_file", &manifest_file)] {
            if value.trim().is_empty() {
                return Err(DeployerError::InvalidSettings {
                    reason: format!("{field} cannot be empty"),
                });
            }
        }
        if self.blob_store.name.trim().is_empty() {
            return Err(DeployerError::InvalidSettings {
                reason: "blob store name cannot be empty".to_string(),
            });
        }

        Ok(Settings::new(
            coordinator_url,
            self.repositories,
            self.request_timeout.unwrap_or(Duration::from_secs(60)),
            self.connect_timeout.unwrap_or(Duration::from_secs(10)),
            marker_file,
            manifest_file,
            self.blob_store,
            self.staging_root.unwrap_or_else(std::env::temp_dir),
        ))
    }
}
