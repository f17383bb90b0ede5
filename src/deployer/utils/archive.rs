//! Zip extraction and packaging.
//!
//! All work here is blocking and runs on the blocking thread pool.

use crate::error::{DeployerError, ErrorExt, Result};
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

async fn blocking<T, F>(task: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        DeployerError::Io(std::io::Error::other(format!("{task} task panicked: {e}")))
    })?
}

/// Extracts `archive` into `dest`, preserving directory structure.
///
/// Entries whose names would escape `dest` are rejected by the zip reader.
pub async fn extract_zip(archive: &Path, dest: &Path) -> Result<PathBuf> {
    super::fs::create_dir_all(dest, true).await?;

    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    blocking("zip extraction", move || {
        let file = std::fs::File::open(&archive).fs_context("opening archive", &archive)?;
        let mut zip = zip::ZipArchive::new(file)?;
        log::debug!(
            "Extracting {} entries from {} into {}",
            zip.len(),
            archive.display(),
            dest.display()
        );
        zip.extract(&dest)?;
        Ok(dest)
    })
    .await
}

/// Packs the contents of `dir` into an in-memory zip archive.
///
/// Entry names are relative to `dir` and use forward slashes.
pub async fn zip_directory(dir: &Path) -> Result<Vec<u8>> {
    let dir = dir.to_path_buf();
    blocking("zip packaging", move || {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        let mut entries: Vec<_> = walkdir::WalkDir::new(&dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .collect::<std::result::Result<_, _>>()?;
        entries.sort_by(|a, b| a.path().cmp(b.path()));

        for entry in entries {
            let rel_path = entry.path().strip_prefix(&dir).map_err(|e| {
                DeployerError::Io(std::io::Error::other(format!(
                    "{} is outside {}: {e}",
                    entry.path().display(),
                    dir.display()
                )))
            })?;
            let name = rel_path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                writer.add_directory(name, options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                let content =
                    std::fs::read(entry.path()).fs_context("reading file to pack", entry.path())?;
                writer.write_all(&content)?;
            }
        }

        Ok(writer.finish()?.into_inner())
    })
    .await
}

/// Parent directories of every file named `marker` below `root`, sorted.
pub async fn find_marker_parents(root: &Path, marker: &str) -> Result<BTreeSet<PathBuf>> {
    let root = root.to_path_buf();
    let marker = marker.to_string();
    blocking("directory walk", move || {
        let mut parents = BTreeSet::new();
        for entry in walkdir::WalkDir::new(&root).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_file() && entry.file_name() == marker.as_str() {
                if let Some(parent) = entry.path().parent() {
                    parents.insert(parent.to_path_buf());
                }
            }
        }
        Ok(parents)
    })
    .await
}
