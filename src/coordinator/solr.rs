//! Coordinator implementation over the Solr admin HTTP API.

use super::response::{
    AdminResponse, BlobQueryResponse, ClusterStatusResponse, CollectionListResponse,
    ConfigSetListResponse, Envelope,
};
use super::{
    AdminFile, BlobRecord, ClusterStatus, CollectionSpec, Coordinator, RequestBody,
};
use crate::deployer::utils::{archive, http::cancellable};
use crate::error::{DeployerError, ErrorExt, Result};
use async_trait::async_trait;
use reqwest::{Body, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use url::Url;

const COLLECTIONS_API: &str = "admin/collections";
const CONFIGS_API: &str = "admin/configs";
const OCTET_STREAM: &str = "application/octet-stream";

/// Talks to a SolrCloud cluster through any of its nodes.
///
/// The client is shared with the artifact resolver and is safe to use
/// concurrently.
#[derive(Debug, Clone)]
pub struct SolrCoordinator {
    client: Client,
    base: Url,
}

impl SolrCoordinator {
    /// `base` is the Solr root, e.g. `http://localhost:8983/solr`.
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        ))?)
    }

    fn request(&self, method: Method, path: &str, params: &[(&str, &str)]) -> Result<RequestBuilder> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().copied())
            .append_pair("wt", "json");
        Ok(self.client.request(method, url))
    }

    /// Sends `request` and decodes a typed response, failing on error statuses.
    async fn call<T>(
        &self,
        operation: &str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        T: DeserializeOwned + AdminResponse,
    {
        let (status, body) = self.send(operation, request, cancel).await?;
        if !status.is_success() {
            return Err(failure(operation, status, &body));
        }

        let decoded: T = serde_json::from_str(&body).map_err(|e| DeployerError::RequestFailed {
            operation: operation.to_string(),
            status: Some(status.as_u16()),
            reason: format!("unexpected response: {e}"),
        })?;

        let header = decoded.header();
        if !header.is_success() {
            return Err(DeployerError::RequestFailed {
                operation: operation.to_string(),
                status: u16::try_from(header.status).ok(),
                reason: format!("coordinator reported status {}", header.status),
            });
        }
        Ok(decoded)
    }

    /// Like [`call`](Self::call) for requests whose body only carries a header.
    async fn execute(
        &self,
        operation: &str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (status, body) = self.send(operation, request, cancel).await?;
        if !status.is_success() {
            return Err(failure(operation, status, &body));
        }
        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) if envelope.is_failure() => Err(DeployerError::RequestFailed {
                operation: operation.to_string(),
                status: u16::try_from(envelope.response_header.status).ok(),
                reason: envelope.reason(),
            }),
            _ => Ok(()),
        }
    }

    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<(StatusCode, String)> {
        cancellable(cancel, async {
            let response = request
                .send()
                .await
                .map_err(|e| DeployerError::coordinator(operation, e))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| DeployerError::coordinator(operation, e))?;
            log::debug!("{} -> {}", operation, status);
            Ok((status, body))
        })
        .await
    }

    async fn collections_action(
        &self,
        action: &str,
        params: &[(&str, &str)],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut all = vec![("action", action)];
        all.extend_from_slice(params);
        let request = self.request(Method::GET, COLLECTIONS_API, &all)?;
        self.execute(action, request, cancel).await
    }
}

fn failure(operation: &str, status: StatusCode, body: &str) -> DeployerError {
    let reason = serde_json::from_str::<Envelope>(body)
        .map(|e| e.reason())
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.to_string()
            } else {
                trimmed.chars().take(512).collect()
            }
        });
    DeployerError::RequestFailed {
        operation: operation.to_string(),
        status: Some(status.as_u16()),
        reason,
    }
}

#[async_trait]
impl Coordinator for SolrCoordinator {
    async fn list_collections(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>> {
        let request = self.request(Method::GET, COLLECTIONS_API, &[("action", "LIST")])?;
        let response: CollectionListResponse = self.call("LIST collections", request, cancel).await?;
        Ok(response.into_names())
    }

    async fn cluster_status(
        &self,
        collection: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ClusterStatus> {
        let mut params = vec![("action", "CLUSTERSTATUS")];
        if let Some(collection) = collection {
            params.push(("collection", collection));
        }
        let request = self.request(Method::GET, COLLECTIONS_API, &params)?;

        let (status, body) = self.send("CLUSTERSTATUS", request, cancel).await?;
        // Asking for an unknown collection is answered with a 400 error.
        if status == StatusCode::BAD_REQUEST
            && collection.is_some()
            && serde_json::from_str::<Envelope>(&body)
                .is_ok_and(|e| e.reason().to_lowercase().contains("not found"))
        {
            return Ok(ClusterStatus {
                success: true,
                collections: Default::default(),
            });
        }
        if !status.is_success() {
            return Err(failure("CLUSTERSTATUS", status, &body));
        }
        let decoded: ClusterStatusResponse =
            serde_json::from_str(&body).map_err(|e| DeployerError::RequestFailed {
                operation: "CLUSTERSTATUS".to_string(),
                status: Some(status.as_u16()),
                reason: format!("unexpected response: {e}"),
            })?;
        Ok(decoded.into())
    }

    async fn create_collection(
        &self,
        spec: &CollectionSpec,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let shards = spec.num_shards.to_string();
        let replicas = spec.num_replicas.to_string();
        let mut params = vec![
            ("name", spec.name.as_str()),
            ("numShards", shards.as_str()),
            ("replicationFactor", replicas.as_str()),
        ];
        if let Some(config) = spec.config_name.as_deref() {
            params.push(("collection.configName", config));
        }
        self.collections_action("CREATE", &params, cancel).await
    }

    async fn delete_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.collections_action("DELETE", &[("name", name)], cancel)
            .await
    }

    async fn list_config_sets(&self, cancel: &CancellationToken) -> Result<BTreeSet<String>> {
        let request = self.request(Method::GET, CONFIGS_API, &[("action", "LIST")])?;
        let response: ConfigSetListResponse = self.call("LIST configs", request, cancel).await?;
        Ok(response.into_names())
    }

    async fn upload_config_set(
        &self,
        name: &str,
        directory: &Path,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let packed = archive::zip_directory(directory).await?;
        log::debug!(
            "Uploading config set {} ({} bytes) from {}",
            name,
            packed.len(),
            directory.display()
        );

        let mut params = vec![("action", "UPLOAD"), ("name", name)];
        if overwrite {
            params.push(("overwrite", "true"));
            params.push(("cleanup", "true"));
        }
        let request = self
            .request(Method::POST, CONFIGS_API, &params)?
            .header(reqwest::header::CONTENT_TYPE, OCTET_STREAM)
            .body(packed);
        self.execute("UPLOAD config", request, cancel).await
    }

    async fn delete_config_set(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        let request = self.request(
            Method::GET,
            CONFIGS_API,
            &[("action", "DELETE"), ("name", name)],
        )?;
        self.execute("DELETE config", request, cancel).await
    }

    async fn link_config_set(
        &self,
        collection: &str,
        config_name: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.collections_action(
            "MODIFYCOLLECTION",
            &[
                ("collection", collection),
                ("collection.configName", config_name),
            ],
            cancel,
        )
        .await
    }

    async fn reload_collection(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.collections_action("RELOAD", &[("name", name)], cancel)
            .await
    }

    async fn read_admin_file(
        &self,
        collection: &str,
        filename: &str,
        cancel: &CancellationToken,
    ) -> Result<AdminFile> {
        let mut url = self.endpoint(&format!("{collection}/admin/file"))?;
        url.query_pairs_mut()
            .append_pair("file", filename)
            .append_pair("contentType", "text/plain;charset=utf-8");
        let request = self.client.get(url);

        let operation = "read admin file";
        cancellable(cancel, async {
            let response = request
                .send()
                .await
                .map_err(|e| DeployerError::coordinator(operation, e))?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(AdminFile::NotFound);
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| DeployerError::coordinator(operation, e))?;
            if !status.is_success() {
                return Err(failure(operation, status, &String::from_utf8_lossy(&body)));
            }
            Ok(AdminFile::Found(body))
        })
        .await
    }

    async fn query_blob_store(
        &self,
        blob_store: &str,
        blob_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BlobRecord>> {
        let query = format!("blobName:\"{}\"", blob_name.replace('"', "\\\""));
        let request = self.request(
            Method::GET,
            &format!("{blob_store}/select"),
            &[
                ("q", query.as_str()),
                ("sort", "version desc"),
                ("fl", "blobName,version"),
                ("rows", "10"),
            ],
        )?;
        let response: BlobQueryResponse = self.call("query blob store", request, cancel).await?;
        Ok(response.into_records())
    }

    async fn post_request(
        &self,
        target: &str,
        path: &str,
        body: RequestBody,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let full_path = format!("{target}/{}", path.trim_start_matches('/'));
        let operation = format!("POST {full_path}");
        let request = self.request(Method::POST, &full_path, &[])?;

        let request = match body {
            RequestBody::Json(value) => request.json(&value),
            RequestBody::File(file) => {
                let handle = tokio::fs::File::open(&file)
                    .await
                    .fs_context("opening upload", &file)?;
                let length = handle
                    .metadata()
                    .await
                    .fs_context("reading upload metadata", &file)?
                    .len();
                request
                    .header(reqwest::header::CONTENT_TYPE, OCTET_STREAM)
                    .header(reqwest::header::CONTENT_LENGTH, length)
                    .body(Body::wrap_stream(ReaderStream::new(handle)))
            }
        };
        self.execute(&operation, request, cancel).await
    }
}
