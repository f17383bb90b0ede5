//! Warnings and reports returned by deployment operations.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A best-effort failure that did not abort the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A runtime dependency could not be resolved or uploaded
    DependencyUnresolved { dependency: String, reason: String },
    /// Neither the add nor the update binding request was accepted
    BindingFailed {
        blob_name: String,
        version: u64,
        reason: String,
    },
    /// The collection's config has no runtime dependency manifest
    ManifestMissing { collection: String },
    /// The manifest could not be read
    ManifestUnreadable { collection: String, reason: String },
    /// The config bundle had several configuration roots
    AmbiguousConfigRoot {
        config: String,
        chosen: PathBuf,
        candidates: Vec<PathBuf>,
    },
    /// A staging directory was left behind
    CleanupFailed { path: PathBuf, reason: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DependencyUnresolved { dependency, reason } => {
                write!(f, "runtime dependency {dependency} not installed: {reason}")
            }
            Warning::BindingFailed {
                blob_name,
                version,
                reason,
            } => write!(f, "runtime dependency {blob_name} (v{version}) not bound: {reason}"),
            Warning::ManifestMissing { collection } => write!(
                f,
                "config of {collection} has no runtime dependency manifest; runtime libs have to be installed manually"
            ),
            Warning::ManifestUnreadable { collection, reason } => {
                write!(f, "cannot read runtime dependencies of {collection}: {reason}")
            }
            Warning::AmbiguousConfigRoot {
                config,
                chosen,
                candidates,
            } => write!(
                f,
                "config bundle {config} contains {} configuration roots, using {}",
                candidates.len(),
                chosen.display()
            ),
            Warning::CleanupFailed { path, reason } => {
                write!(f, "could not remove {}: {reason}", path.display())
            }
        }
    }
}

/// Outcome of [`ConfigBundleInstaller::ensure_installed`](super::ConfigBundleInstaller::ensure_installed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInstall {
    /// Whether a bundle was downloaded and uploaded
    pub uploaded: bool,
    pub warnings: Vec<Warning>,
}

/// Outcome of runtime dependency installation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyInstall {
    /// Installed blob versions by blob name
    pub versions: BTreeMap<String, u64>,
    pub warnings: Vec<Warning>,
}

/// Outcome of a collection create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentReport {
    pub collection: String,
    pub config_name: String,
    /// True when the collection was created or switched to a new config set
    pub config_changed: bool,
    /// Runtime dependencies bound to the collection, by blob name
    pub dependencies: BTreeMap<String, u64>,
    pub warnings: Vec<Warning>,
}

impl DeploymentReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
