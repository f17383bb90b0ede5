//! HTTP utilities for downloading artifacts.
//!
//! Provides the shared client constructor, cancellation guard, and
//! streaming download helpers used by the artifact resolver.

use crate::error::{DeployerError, ErrorExt, Result};
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of a GET against a repository.
#[derive(Debug)]
pub enum Fetch<T> {
    /// The server answered with a success status
    Found(T),
    /// The server answered with a non-success status
    Missing(StatusCode),
}

/// Builds the long-lived client shared by every download.
pub fn build_client(connect_timeout: Duration, request_timeout: Duration) -> Result<Client> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .user_agent(concat!("solr-deployer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(DeployerError::Http)
}

/// Runs `fut` unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DeployerError::Cancelled),
        result = fut => result,
    }
}

/// Elapsed client timeouts surface as [`DeployerError::Timeout`].
fn transfer_error(url: &Url, err: reqwest::Error) -> DeployerError {
    if err.is_timeout() {
        DeployerError::Timeout {
            operation: format!("GET {url}"),
        }
    } else {
        DeployerError::Http(err)
    }
}

/// Downloads `url` into `dest_dir`, naming the file after the last URL segment.
///
/// A partially written file is removed when the transfer fails.
pub async fn download_to(
    client: &Client,
    url: &Url,
    dest_dir: &Path,
    cancel: &CancellationToken,
) -> Result<Fetch<PathBuf>> {
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| DeployerError::InvalidSettings {
            reason: format!("URL has no file name: {url}"),
        })?
        .to_string();
    let target = dest_dir.join(&file_name);

    cancellable(cancel, async {
        log::info!("Downloading {}", url);
        let mut response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transfer_error(url, e))?;
        if !response.status().is_success() {
            return Ok(Fetch::Missing(response.status()));
        }

        let mut file = tokio::fs::File::create(&target)
            .await
            .fs_context("creating download target", &target)?;

        let written: Result<()> = async {
            while let Some(chunk) = response.chunk().await.map_err(|e| transfer_error(url, e))? {
                file.write_all(&chunk)
                    .await
                    .fs_context("writing download", &target)?;
            }
            file.flush().await.fs_context("flushing download", &target)?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&target).await;
            return Err(e);
        }

        Ok(Fetch::Found(target.clone()))
    })
    .await
}

/// Fetches `url` as text.
pub async fn fetch_text(
    client: &Client,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<Fetch<String>> {
    cancellable(cancel, async {
        log::debug!("Fetching {}", url);
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transfer_error(url, e))?;
        if !response.status().is_success() {
            return Ok(Fetch::Missing(response.status()));
        }
        let text = response.text().await.map_err(|e| transfer_error(url, e))?;
        Ok(Fetch::Found(text))
    })
    .await
}
