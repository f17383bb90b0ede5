//! Artifact resolution across an ordered repository list.

use super::{ArtifactCoordinate, Repository, SnapshotVersion};
use crate::deployer::utils::{
    fs,
    http::{self, Fetch},
};
use crate::error::{DeployerError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;

/// A staged local copy of an artifact.
///
/// The file lives inside the caller's staging directory; removing that
/// directory disposes of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Staged file
    pub path: PathBuf,
    /// Coordinate it was resolved from
    pub coordinate: ArtifactCoordinate,
    /// Repository that supplied it
    pub repository: Repository,
}

/// Locates and downloads artifacts.
///
/// Holds the shared HTTP client; cloning is cheap and clones share the
/// client's connection pool.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    client: Client,
    repositories: Vec<Repository>,
}

impl ArtifactResolver {
    /// Creates a resolver over `repositories`, highest priority first.
    pub fn new(client: Client, repositories: Vec<Repository>) -> Self {
        Self {
            client,
            repositories,
        }
    }

    /// Configured repositories in priority order.
    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// Resolves `name` against the configured repositories into `dest_dir`.
    pub async fn resolve(
        &self,
        name: &str,
        dest_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<ResolvedArtifact> {
        self.resolve_from(name, &self.repositories, dest_dir, cancel)
            .await
    }

    /// Resolves `name` against `repositories` into `dest_dir`.
    ///
    /// Repositories are tried once each, in order; the first hit wins and
    /// no further repository is contacted. The coordinate is validated
    /// before any I/O happens.
    pub async fn resolve_from(
        &self,
        name: &str,
        repositories: &[Repository],
        dest_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<ResolvedArtifact> {
        let coordinate = ArtifactCoordinate::parse(name)?;

        for repository in repositories {
            if cancel.is_cancelled() {
                return Err(DeployerError::Cancelled);
            }

            let attempt = match repository {
                Repository::Local(root) => self.try_local(root, &coordinate, dest_dir).await,
                Repository::Http(base) => self.try_http(base, &coordinate, dest_dir, cancel).await,
            };

            match attempt {
                Ok(Some(path)) => {
                    log::info!("Resolved {} from {}", coordinate, repository);
                    return Ok(ResolvedArtifact {
                        path,
                        coordinate,
                        repository: repository.clone(),
                    });
                }
                Ok(None) => {
                    log::debug!("{} not present in {}", coordinate, repository);
                }
                Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
                Err(e) => {
                    log::warn!("Unable to fetch {} from {}: {}", coordinate, repository, e);
                }
            }
        }

        Err(DeployerError::ArtifactNotFound {
            coordinate: coordinate.to_string(),
            repositories: repositories.iter().map(ToString::to_string).collect(),
        })
    }

    async fn try_local(
        &self,
        root: &Path,
        coordinate: &ArtifactCoordinate,
        dest_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let source = root.join(coordinate.release_path());
        if !fs::exists(&source).await {
            return Ok(None);
        }
        fs::copy_into(&source, dest_dir).await.map(Some)
    }

    /// Release path first; on any failure fall back to the snapshot named
    /// by the metadata document.
    async fn try_http(
        &self,
        base: &Url,
        coordinate: &ArtifactCoordinate,
        dest_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<PathBuf>> {
        let release = Repository::join_url(base, &coordinate.release_path())?;
        match http::download_to(&self.client, &release, dest_dir, cancel).await {
            Ok(Fetch::Found(path)) => return Ok(Some(path)),
            Ok(Fetch::Missing(status)) => {
                log::debug!("{} answered {} for {}", base, status, coordinate);
            }
            Err(DeployerError::Cancelled) => return Err(DeployerError::Cancelled),
            Err(e) => {
                log::warn!("Unable to find {} in repo {}: {}", coordinate, base, e);
            }
        }

        let metadata_url = Repository::join_url(base, &coordinate.metadata_path())?;
        let document = match http::fetch_text(&self.client, &metadata_url, cancel).await? {
            Fetch::Found(document) => document,
            Fetch::Missing(status) => {
                log::debug!("No snapshot metadata for {} in {} ({})", coordinate, base, status);
                return Ok(None);
            }
        };

        let Some(snapshot) = SnapshotVersion::parse(&document) else {
            log::warn!(
                "Snapshot metadata for {} in {} has no timestamp/buildNumber",
                coordinate,
                base
            );
            return Ok(None);
        };

        let snapshot_url = Repository::join_url(
            base,
            &coordinate.snapshot_path(&snapshot.timestamp, &snapshot.build_number),
        )?;
        match http::download_to(&self.client, &snapshot_url, dest_dir, cancel).await? {
            Fetch::Found(path) => Ok(Some(path)),
            Fetch::Missing(status) => {
                log::warn!("{} cannot be found in {} ({})", coordinate, base, status);
                Ok(None)
            }
        }
    }
}
