//! File system utilities for staging artifacts.
//!
//! Provides per-operation staging directories with explicit, best-effort
//! cleanup and a few idempotent helpers.

use crate::error::{DeployerError, ErrorExt, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// A uniquely named scratch directory owned by a single operation.
///
/// Call [`StagingDir::cleanup`] on every exit path to observe removal
/// failures; if the value is dropped instead, removal is still attempted
/// silently.
#[derive(Debug)]
pub struct StagingDir {
    inner: tempfile::TempDir,
}

impl StagingDir {
    /// Creates `<root>/<prefix><random>`.
    ///
    /// The root is created if missing. Names are unique per call, so
    /// unrelated operations can share the same root.
    pub async fn create(root: &Path, prefix: &str) -> Result<Self> {
        fs::create_dir_all(root)
            .await
            .fs_context("creating staging root", root)?;

        let root = root.to_path_buf();
        let prefix = sanitize_prefix(prefix);
        let inner = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .tempdir_in(&root)
                .fs_context("creating staging directory in", &root)
        })
        .await
        .map_err(|e| DeployerError::Io(io::Error::other(format!("Staging task panicked: {e}"))))??;

        log::debug!("Created staging directory {}", inner.path().display());
        Ok(Self { inner })
    }

    /// Path of the staging directory.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Removes the directory and all descendants.
    ///
    /// Returns [`DeployerError::CleanupFailed`] instead of propagating I/O
    /// errors so callers can log and move on.
    pub async fn cleanup(self) -> std::result::Result<(), DeployerError> {
        let path = self.inner.path().to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || self.inner.close()).await;

        match outcome {
            Ok(Ok(())) => {
                log::debug!("Removed staging directory {}", path.display());
                Ok(())
            }
            Ok(Err(e)) => Err(DeployerError::CleanupFailed {
                path,
                reason: e.to_string(),
            }),
            Err(e) => Err(DeployerError::CleanupFailed {
                path,
                reason: format!("cleanup task panicked: {e}"),
            }),
        }
    }
}

/// Coordinates contain characters that are awkward in file names.
fn sanitize_prefix(prefix: &str) -> String {
    let mut cleaned: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    cleaned.push('-');
    cleaned
}

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(DeployerError::Fs {
            action: "removing directory".to_string(),
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Copies a regular file into `dest_dir`, keeping its file name.
///
/// Fails if the source path is a directory or doesn't exist.
pub async fn copy_into(from: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !from.is_file() {
        return Err(DeployerError::Fs {
            action: "copying".to_string(),
            path: from.to_path_buf(),
            source: io::Error::new(io::ErrorKind::NotFound, "not a regular file"),
        });
    }
    let file_name = from.file_name().ok_or_else(|| DeployerError::Fs {
        action: "copying".to_string(),
        path: from.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
    })?;

    fs::create_dir_all(dest_dir)
        .await
        .fs_context("creating destination directory", dest_dir)?;
    let to = dest_dir.join(file_name);
    fs::copy(from, &to).await.fs_context("copying artifact", from)?;
    Ok(to)
}

/// Returns true when `path` exists; permission errors count as absent.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}
