//! Command line argument parsing.
//!
//! Global flags override values read from the settings file; both fall
//! back to the built-in defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Config set and runtime library deployment for SolrCloud
#[derive(Parser, Debug)]
#[command(
    name = "solr-deployer",
    version,
    about = "Config set and runtime library deployment for SolrCloud",
    long_about = "Creates and updates SolrCloud collections from config bundles stored in Maven repositories.

Config bundles and runtime libraries are named by group:artifact:version coordinates.
Repositories are tried in the order given; local directories and http(s) URLs are accepted.

Usage:
  solr-deployer -r /srv/m2 create products com.acme:products-conf:1.0 --shards 2
  solr-deployer -r https://repo.example/maven2 deploy products com.acme:products-conf:1.1
  solr-deployer resolve com.acme:lib:2.0 --dest ./libs

Exit code 0 = every fatal step succeeded; best-effort failures are logged as warnings."
)]
pub struct Args {
    /// Settings file (TOML)
    #[arg(id = "config_file", short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Solr base URL, e.g. http://localhost:8983/solr
    #[arg(long, env = "SOLR_DEPLOYER_COORDINATOR", value_name = "URL", global = true)]
    pub coordinator: Option<String>,

    /// Artifact repository, highest priority first (repeatable)
    #[arg(
        short = 'r',
        long = "repository",
        env = "SOLR_DEPLOYER_REPOSITORIES",
        value_delimiter = ',',
        value_name = "REPO",
        global = true
    )]
    pub repositories: Vec<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a collection bound to a config bundle
    Create {
        collection: String,
        /// Config bundle coordinate
        config: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        shards: u32,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        replicas: u32,
    },

    /// Switch an existing collection to a config bundle
    Update {
        collection: String,
        /// Config bundle coordinate
        config: String,
    },

    /// Create the collection if absent, otherwise update it
    Deploy {
        collection: String,
        /// Config bundle coordinate
        config: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        shards: u32,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        replicas: u32,
    },

    /// Delete a collection
    RemoveCollection { name: String },

    /// Delete a config set
    RemoveConfig { name: String },

    /// Upload a config bundle as a config set
    InstallConfig {
        /// Config bundle coordinate
        name: String,
        /// Replace the config set when it already exists
        #[arg(long)]
        force: bool,
    },

    /// Install and bind the runtime libraries a collection declares
    Deps { collection: String },

    /// Download an artifact into a directory
    Resolve {
        /// Artifact coordinate
        coordinate: String,
        #[arg(long, value_name = "DIR")]
        dest: PathBuf,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the command needs the blob store collection to exist.
    pub fn needs_blob_store(&self) -> bool {
        matches!(
            self.command,
            Command::Create { .. }
                | Command::Update { .. }
                | Command::Deploy { .. }
                | Command::Deps { .. }
        )
    }
}
