//! TOML settings file.

use super::{BlobStoreSettings, SettingsBuilder};
use crate::deployer::artifact::Repository;
use crate::error::{ErrorExt, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// On-disk representation of the settings. Every field is optional.
///
/// ```toml
/// coordinator = "http://localhost:8983/solr"
/// repositories = ["/srv/m2", "https://repo1.maven.org/maven2"]
/// request_timeout_secs = 30
///
/// [blob_store]
/// name = ".system"
/// shards = 1
/// replicas = 1
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub coordinator: Option<String>,
    #[serde(default)]
    pub repositories: Vec<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub marker_file: Option<String>,
    pub manifest_file: Option<String>,
    pub staging_root: Option<PathBuf>,
    pub blob_store: Option<BlobStoreFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlobStoreFile {
    pub name: Option<String>,
    pub shards: Option<u32>,
    pub replicas: Option<u32>,
}

impl SettingsFile {
    /// Reads and parses a settings file.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading settings file", path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Applies every field that is set onto `builder`.
    pub fn apply(self, mut builder: SettingsBuilder) -> Result<SettingsBuilder> {
        if let Some(coordinator) = self.coordinator {
            builder = builder.coordinator(coordinator);
        }
        if !self.repositories.is_empty() {
            let repositories = self
                .repositories
                .iter()
                .map(|r| Repository::parse(r))
                .collect::<Result<Vec<_>>>()?;
            builder = builder.repositories(repositories);
        }
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(marker) = self.marker_file {
            builder = builder.marker_file(marker);
        }
        if let Some(manifest) = self.manifest_file {
            builder = builder.manifest_file(manifest);
        }
        if let Some(root) = self.staging_root {
            builder = builder.staging_root(root);
        }
        if let Some(blob) = self.blob_store {
            let defaults = BlobStoreSettings::default();
            builder = builder.blob_store(BlobStoreSettings {
                name: blob.name.unwrap_or(defaults.name),
                shards: blob.shards.unwrap_or(defaults.shards),
                replicas: blob.replicas.unwrap_or(defaults.replicas),
            });
        }
        Ok(builder)
    }
}
