//! Solr Deployer - config set and runtime library deployment for SolrCloud.
//!
//! This binary creates and updates collections from config bundles stored
//! in Maven repositories and installs the runtime libraries they declare.

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Run CLI and get exit code
    let exit_code = match solr_deployer::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", anyhow::Error::new(e));
            1
        }
    };

    process::exit(exit_code);
}
