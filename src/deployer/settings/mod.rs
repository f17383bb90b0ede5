//! Configuration structures for deployment operations.
//!
//! Settings are assembled from a TOML file, then command line overrides,
//! through [`SettingsBuilder`].

mod builder;
mod core;
mod file;

pub use builder::{
    DEFAULT_COORDINATOR, DEFAULT_MANIFEST_FILE, DEFAULT_MARKER_FILE, SettingsBuilder,
};
pub use core::{BlobStoreSettings, Settings};
pub use file::{BlobStoreFile, SettingsFile};
