//! Shared fixtures: an in-memory coordinator, Maven repository builders,
//! and a fake HTTP repository.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use bytes::Bytes;
use solr_deployer::coordinator::{
    AdminFile, BlobRecord, ClusterStatus, CollectionSpec, CollectionStatus, Coordinator,
    RequestBody,
};
use solr_deployer::deployer::utils::archive;
use solr_deployer::deployer::{
    ArtifactCoordinate, CollectionOrchestrator, Settings, SettingsBuilder, Repository,
};
use solr_deployer::{DeployerError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// A config set upload as seen by the coordinator.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub directory: PathBuf,
    pub files: Vec<String>,
    pub overwrite: bool,
}

#[derive(Debug, Default)]
pub struct State {
    pub collections: BTreeMap<String, Option<String>>,
    pub config_sets: BTreeSet<String>,
    pub blobs: BTreeMap<String, Vec<u64>>,
    pub admin_files: BTreeMap<(String, String), AdminFile>,
    pub calls: Vec<String>,
    pub uploads: Vec<Upload>,
    pub failing: Vec<String>,
    pub status_unsuccessful: bool,
}

/// In-memory coordinator that records every call.
///
/// Calls whose log line starts with a registered prefix fail with
/// [`DeployerError::RequestFailed`].
#[derive(Debug, Default, Clone)]
pub struct RecordingCoordinator {
    state: Arc<Mutex<State>>,
}

impl RecordingCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, name: &str, config: Option<&str>) -> Self {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(name.to_string(), config.map(str::to_string));
        self
    }

    pub fn with_config_set(self, name: &str) -> Self {
        self.state.lock().unwrap().config_sets.insert(name.to_string());
        self
    }

    pub fn with_blob(self, blob_name: &str, versions: &[u64]) -> Self {
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(blob_name.to_string(), versions.to_vec());
        self
    }

    pub fn with_admin_file(self, collection: &str, file: &str, content: &str) -> Self {
        self.state.lock().unwrap().admin_files.insert(
            (collection.to_string(), file.to_string()),
            AdminFile::Found(Bytes::from(content.to_string())),
        );
        self
    }

    pub fn failing(self, prefix: &str) -> Self {
        self.state.lock().unwrap().failing.push(prefix.to_string());
        self
    }

    pub fn with_unsuccessful_status(self) -> Self {
        self.state.lock().unwrap().status_unsuccessful = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(prefix))
            .collect()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn collection_config(&self, name: &str) -> Option<Option<String>> {
        self.state.lock().unwrap().collections.get(name).cloned()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.state.lock().unwrap().collections.contains_key(name)
    }

    pub fn has_config_set(&self, name: &str) -> bool {
        self.state.lock().unwrap().config_sets.contains(name)
    }

    pub fn blob_versions(&self, blob_name: &str) -> Vec<u64> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .get(blob_name)
            .cloned()
            .unwrap_or_default()
    }

    /// Logs `call` and fails it when a registered prefix matches.
    fn record(&self, call: String, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(DeployerError::Cancelled);
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(call.clone());
        if state.failing.iter().any(|prefix| call.starts_with(prefix)) {
            return Err(DeployerError::RequestFailed {
                operation: call,
                status: Some(500),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Coordinator for RecordingCoordinator {
    async fn list_collections(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>> {
        self.record("list_collections".to_string(), cancel)?;
        Ok(self.state.lock().unwrap().collections.keys().cloned().collect())
    }

    async fn cluster_status(
        &self,
        collection: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ClusterStatus> {
        let call = match collection {
            Some(name) => format!("cluster_status {name}"),
            None => "cluster_status".to_string(),
        };
        self.record(call, cancel)?;

        let state = self.state.lock().unwrap();
        let collections = state
            .collections
            .iter()
            .filter(|(name, _)| collection.is_none_or(|wanted| wanted == name.as_str()))
            .map(|(name, config)| {
                (
                    name.clone(),
                    CollectionStatus {
                        config_name: config.clone(),
                        shard_count: 1,
                    },
                )
            })
            .collect();
        Ok(ClusterStatus {
            success: !state.status_unsuccessful,
            collections,
        })
    }

    async fn create_collection(
        &self,
        spec: &CollectionSpec,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(format!("create {}", spec.name), cancel)?;
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(spec.name.clone(), spec.config_name.clone());
        Ok(())
    }

    async fn delete_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.record(format!("delete {name}"), cancel)?;
        self.state.lock().unwrap().collections.remove(name);
        Ok(())
    }

    async fn list_config_sets(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>> {
        self.record("list_configs".to_string(), cancel)?;
        Ok(self.state.lock().unwrap().config_sets.clone())
    }

    async fn upload_config_set(
        &self,
        name: &str,
        directory: &Path,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let files = relative_files(directory);
        self.record(format!("upload {name}"), cancel)?;
        let mut state = self.state.lock().unwrap();
        state.uploads.push(Upload {
            name: name.to_string(),
            directory: directory.to_path_buf(),
            files,
            overwrite,
        });
        state.config_sets.insert(name.to_string());
        Ok(())
    }

    async fn delete_config_set(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.record(format!("delete_config {name}"), cancel)?;
        self.state.lock().unwrap().config_sets.remove(name);
        Ok(())
    }

    async fn link_config_set(
        &self,
        collection: &str,
        config_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(format!("link {collection} {config_name}"), cancel)?;
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), Some(config_name.to_string()));
        Ok(())
    }

    async fn reload_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.record(format!("reload {name}"), cancel)
    }

    async fn read_admin_file(
        &self,
        collection: &str,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<AdminFile> {
        self.record(format!("read {collection} {filename}"), cancel)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .admin_files
            .get(&(collection.to_string(), filename.to_string()))
            .cloned()
            .unwrap_or(AdminFile::NotFound))
    }

    async fn query_blob_store(
        &self,
        blob_store: &str,
        blob_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlobRecord>> {
        self.record(format!("query {blob_store} {blob_name}"), cancel)?;
        let mut versions = self.blob_versions(blob_name);
        versions.sort_unstable_by(|a, b| b.cmp(a));
        Ok(versions
            .into_iter()
            .map(|version| BlobRecord {
                blob_name: blob_name.to_string(),
                version,
            })
            .collect())
    }

    async fn post_request(
        &self,
        target: &str,
        path: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> Result<()> {
        match body {
            RequestBody::Json(value) => {
                let (command, name) = value
                    .as_object()
                    .and_then(|o| o.iter().next())
                    .map(|(command, args)| {
                        (command.clone(), args["name"].as_str().unwrap_or("").to_string())
                    })
                    .unwrap_or_default();
                self.record(format!("post {target} {path} {command} {name}"), cancel)
            }
            RequestBody::File(file) => {
                assert!(file.is_file(), "uploaded blob {} must exist", file.display());
                self.record(format!("post {target} {path}"), cancel)?;
                if let Some(blob_name) = path.strip_prefix("/blob/") {
                    let mut state = self.state.lock().unwrap();
                    let versions = state.blobs.entry(blob_name.to_string()).or_default();
                    let next = versions.iter().max().map_or(1, |v| v + 1);
                    versions.push(next);
                }
                Ok(())
            }
        }
    }
}

fn relative_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Writes `content` at the release path of `coordinate` inside `repo`.
pub fn publish(repo: &Path, coordinate: &str, content: &[u8]) -> PathBuf {
    let coordinate = ArtifactCoordinate::parse(coordinate).unwrap();
    let target = repo.join(coordinate.release_path());
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, content).unwrap();
    target
}

/// Zips `files` (relative path, content) into a bundle bytes.
pub async fn bundle(files: &[(&str, &str)]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    for (path, content) in files {
        let target = dir.path().join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, content).unwrap();
    }
    archive::zip_directory(dir.path()).await.unwrap()
}

/// Publishes a config bundle made of `files` under `coordinate`.
pub async fn publish_bundle(repo: &Path, coordinate: &str, files: &[(&str, &str)]) -> PathBuf {
    let bytes = bundle(files).await;
    publish(repo, coordinate, &bytes)
}

/// Settings over local repositories with staging under `staging`.
pub fn local_settings(repositories: &[&Path], staging: &Path) -> Settings {
    SettingsBuilder::new()
        .repositories(
            repositories
                .iter()
                .map(|p| Repository::Local(p.to_path_buf()))
                .collect(),
        )
        .staging_root(staging)
        .build()
        .unwrap()
}

pub fn orchestrator(settings: Settings, coordinator: &RecordingCoordinator) -> CollectionOrchestrator {
    CollectionOrchestrator::new(settings, Arc::new(coordinator.clone()), test_client())
}

/// Client that never goes through a proxy, for loopback servers.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Entries left in a staging root.
pub fn leftovers(staging: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(staging) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// Fake HTTP Maven repository served under `/maven2/`.
pub struct FakeRepository {
    pub url: String,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FakeRepository {
    /// Starts serving `files`, keyed by layout-relative path.
    pub async fn serve(files: HashMap<String, Vec<u8>>) -> Self {
        let files = Arc::new(files);
        let hits = Arc::new(Mutex::new(Vec::new()));

        let handler = {
            let files = files.clone();
            let hits = hits.clone();
            move |uri: Uri| {
                let files = files.clone();
                let hits = hits.clone();
                async move {
                    let path = uri.path().to_string();
                    hits.lock().unwrap().push(path.clone());
                    let key = path.strip_prefix("/maven2/").unwrap_or(&path);
                    match files.get(key) {
                        Some(body) => (StatusCode::OK, body.clone()).into_response(),
                        None => StatusCode::NOT_FOUND.into_response(),
                    }
                }
            }
        };
        let app = Router::new().fallback(handler);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{addr}/maven2"),
            hits,
        }
    }

    pub fn repository(&self) -> Repository {
        Repository::parse(&self.url).unwrap()
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self, suffix: &str) -> usize {
        self.hits().iter().filter(|h| h.ends_with(suffix)).count()
    }
}
