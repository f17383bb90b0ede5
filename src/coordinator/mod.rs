//! Cluster coordinator boundary.
//!
//! The deployer never talks to the cluster except through [`Coordinator`].
//! [`SolrCoordinator`] implements it over the Solr admin HTTP API; tests
//! substitute in-memory fakes.
//!
//! # Module Organization
//!
//! - [`response`] - typed records for the coordinator's JSON payloads
//! - [`solr`] - HTTP implementation backed by a shared `reqwest::Client`

pub mod response;
mod solr;

pub use solr::SolrCoordinator;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Parameters for creating a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    /// Collection name
    pub name: String,
    /// Config set bound to the collection; `None` lets the cluster choose
    pub config_name: Option<String>,
    /// Number of shards
    pub num_shards: u32,
    /// Replicas per shard
    pub num_replicas: u32,
}

/// State of one collection as reported by the cluster status call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStatus {
    /// Config set currently linked to the collection
    pub config_name: Option<String>,
    /// Number of shards the coordinator knows about
    pub shard_count: usize,
}

/// Decoded cluster status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterStatus {
    /// Whether the coordinator reported success
    pub success: bool,
    /// Collections by name
    pub collections: BTreeMap<String, CollectionStatus>,
}

impl ClusterStatus {
    /// Config name bound to `collection`, if the collection is present.
    pub fn config_name(&self, collection: &str) -> Option<&str> {
        self.collections
            .get(collection)
            .and_then(|c| c.config_name.as_deref())
    }
}

/// One stored blob version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRecord {
    /// Blob identity
    pub blob_name: String,
    /// Version number assigned by the blob store
    pub version: u64,
}

/// Result of reading a file from a collection's admin file endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminFile {
    /// The file was served
    Found(Bytes),
    /// The coordinator reported the file as absent
    NotFound,
}

/// Payload of a generic POST request.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON document
    Json(serde_json::Value),
    /// Raw file content, streamed from disk
    File(PathBuf),
}

/// Capability contract the deployer requires from the cluster coordinator.
///
/// Every call honours `cancel`; implementations return
/// [`DeployerError::Cancelled`](crate::DeployerError::Cancelled) once it fires.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Names of all collections.
    async fn list_collections(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>>;

    /// Cluster status, optionally restricted to one collection.
    async fn cluster_status(
        &self,
        collection: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ClusterStatus>;

    /// Creates a collection.
    async fn create_collection(
        &self,
        spec: &CollectionSpec,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Deletes a collection.
    async fn delete_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// Names of all deployed config sets.
    async fn list_config_sets(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>>;

    /// Uploads `directory` as config set `name`, replacing it when `overwrite` is set.
    async fn upload_config_set(
        &self,
        name: &str,
        directory: &Path,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Deletes a config set.
    async fn delete_config_set(&self, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// Points `collection` at config set `config_name`.
    async fn link_config_set(
        &self,
        collection: &str,
        config_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Reloads a collection so it picks up its current config set.
    async fn reload_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// Reads `filename` from the collection's config through the admin file endpoint.
    async fn read_admin_file(
        &self,
        collection: &str,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<AdminFile>;

    /// Versions stored under `blob_name`, highest version first.
    async fn query_blob_store(
        &self,
        blob_store: &str,
        blob_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlobRecord>>;

    /// Posts `body` to `path` on a collection (or the blob store).
    async fn post_request(
        &self,
        target: &str,
        path: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
