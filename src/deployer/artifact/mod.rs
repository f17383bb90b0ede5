//! Artifact coordinates, repositories, and resolution.
//!
//! Artifacts are addressed as `group:artifact:version` and looked up in an
//! ordered list of local or HTTP repositories using the Maven layout. When
//! an HTTP repository has no release file, the snapshot metadata document is
//! consulted to build the timestamped file name.

mod coordinate;
mod metadata;
mod repository;
mod resolver;

pub use coordinate::{ARTIFACT_EXTENSION, ArtifactCoordinate, METADATA_FILE};
pub use metadata::SnapshotVersion;
pub use repository::Repository;
pub use resolver::{ArtifactResolver, ResolvedArtifact};
