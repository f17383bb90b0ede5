//! Deployment of Solr config sets and runtime libraries.
//!
//! This library keeps a SolrCloud collection in step with a config bundle
//! published to a Maven-style repository:
//! - Config bundles are resolved, unpacked, and uploaded as config sets
//! - Runtime libraries listed by the config are stored in the blob store
//!   and bound to the collection
//! - Collections are created or switched to a new config set and reloaded
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod coordinator;
pub mod deployer;
pub mod error;

// Re-export commonly used types
pub use error::{DeployerError, ErrorExt, Result};
