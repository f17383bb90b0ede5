//! Configuration and runtime library deployment.
//!
//! # Overview
//!
//! The deployer:
//! 1. Resolves artifacts from an ordered list of repositories
//! 2. Publishes config bundles as named config sets
//! 3. Installs runtime libraries into the blob store collection
//! 4. Creates or updates collections and binds their runtime libraries
//!
//! # Example
//!
//! ```no_run
//! use solr_deployer::deployer::{CollectionOrchestrator, Repository, SettingsBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> solr_deployer::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .coordinator("http://localhost:8983/solr")
//!     .repository(Repository::parse("https://repo1.maven.org/maven2")?)
//!     .build()?;
//!
//! let orchestrator = CollectionOrchestrator::from_settings(settings)?;
//! let cancel = CancellationToken::new();
//! orchestrator.ensure_blob_store(&cancel).await?;
//!
//! let report = orchestrator
//!     .create_collection("products", "com.acme:products-conf:1.0", 2, 1, &cancel)
//!     .await?;
//! for warning in &report.warnings {
//!     println!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`artifact`] - coordinates, repositories, and the resolver
//! - [`config_set`] - config bundle download, extraction, and upload
//! - [`runtime_lib`] - blob installation and runtime lib binding
//! - [`orchestrator`] - the collection create/update workflow
//! - [`settings`] - settings, builder, and settings file
//! - [`utils`] - staging directories, archives, and HTTP helpers

pub mod artifact;
pub mod config_set;
pub mod orchestrator;
pub mod report;
pub mod runtime_lib;
pub mod settings;
pub mod utils;

pub use artifact::{ArtifactCoordinate, ArtifactResolver, Repository, ResolvedArtifact};
pub use config_set::ConfigBundleInstaller;
pub use orchestrator::CollectionOrchestrator;
pub use report::{ConfigInstall, DependencyInstall, DeploymentReport, Warning};
pub use runtime_lib::{BindingAction, Manifest, RuntimeLibraryManager};
pub use settings::{BlobStoreSettings, Settings, SettingsBuilder, SettingsFile};
