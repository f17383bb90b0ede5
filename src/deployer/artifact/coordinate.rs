//! `group:artifact:version` coordinates and the repository layout derived from them.

use crate::error::{DeployerError, Result};
use std::fmt;
use std::str::FromStr;

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// File extension of every artifact this deployer resolves.
pub const ARTIFACT_EXTENSION: &str = "jar";

/// Metadata document used for snapshot resolution.
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// A parsed artifact coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactCoordinate {
    group: String,
    artifact: String,
    version: String,
}

impl ArtifactCoordinate {
    /// Parses `group:artifact:version`.
    ///
    /// Exactly three non-empty segments are accepted. Every segment must
    /// stay a plain path component: no separators, whitespace, or `.`/`..`,
    /// and the group must not contain empty dot-separated parts.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || DeployerError::ArtifactFormatInvalid {
            name: name.to_string(),
        };

        let segments: Vec<&str> = name.trim().split(':').collect();
        match segments.as_slice() {
            [group, artifact, version]
                if group.split('.').all(is_path_component)
                    && is_path_component(artifact)
                    && is_path_component(version) =>
            {
                Ok(Self {
                    group: group.to_string(),
                    artifact: artifact.to_string(),
                    version: version.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn artifact(&self) -> &str {
        &self.artifact
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// Blob store identity: the coordinate with colons replaced by underscores.
    pub fn blob_name(&self) -> String {
        format!("{}_{}_{}", self.group, self.artifact, self.version)
    }

    /// `group/with/slashes/artifact/version`
    fn version_dir(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// Conventional release path, relative to a repository root.
    pub fn release_path(&self) -> String {
        format!(
            "{}/{}-{}.{}",
            self.version_dir(),
            self.artifact,
            self.version,
            ARTIFACT_EXTENSION
        )
    }

    /// Metadata document path, relative to a repository root.
    pub fn metadata_path(&self) -> String {
        format!("{}/{}", self.version_dir(), METADATA_FILE)
    }

    /// Timestamped snapshot path, relative to a repository root.
    ///
    /// `1.0-SNAPSHOT` with timestamp `20230101.010101` and build 3 becomes
    /// `artifact-1.0-20230101.010101-3.jar`.
    pub fn snapshot_path(&self, timestamp: &str, build_number: &str) -> String {
        let base = self
            .version
            .strip_suffix(SNAPSHOT_SUFFIX)
            .unwrap_or(&self.version);
        format!(
            "{}/{}-{}-{}-{}.{}",
            self.version_dir(),
            self.artifact,
            base,
            timestamp,
            build_number,
            ARTIFACT_EXTENSION
        )
    }
}

/// A non-empty segment that maps onto exactly one directory or file name.
fn is_path_component(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace())
}

impl FromStr for ArtifactCoordinate {
    type Err = DeployerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}
