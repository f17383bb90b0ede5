//! Filesystem, archive, and HTTP helpers shared by the deployer.

pub mod archive;
pub mod fs;
pub mod http;
