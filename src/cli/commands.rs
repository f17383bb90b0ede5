//! Command execution.

use super::{Args, Command};
use crate::deployer::{CollectionOrchestrator, DeploymentReport, Settings, utils::fs};
use crate::error::Result;
use tokio_util::sync::CancellationToken;

/// Runs the parsed command and returns the process exit code.
pub async fn execute(args: &Args, settings: Settings, cancel: &CancellationToken) -> Result<i32> {
    let orchestrator = CollectionOrchestrator::from_settings(settings)?;
    if args.needs_blob_store() {
        orchestrator.ensure_blob_store(cancel).await?;
    }

    match &args.command {
        Command::Create {
            collection,
            config,
            shards,
            replicas,
        } => {
            let report = orchestrator
                .create_collection(collection, config, *shards, *replicas, cancel)
                .await?;
            print_report(&report);
        }
        Command::Update { collection, config } => {
            let report = orchestrator
                .update_collection(collection, config, cancel)
                .await?;
            print_report(&report);
        }
        Command::Deploy {
            collection,
            config,
            shards,
            replicas,
        } => {
            let report = orchestrator
                .create_or_update(collection, config, *shards, *replicas, cancel)
                .await?;
            print_report(&report);
        }
        Command::RemoveCollection { name } => {
            if orchestrator.remove_collection(name, cancel).await? {
                println!("Removed collection {name}");
            }
        }
        Command::RemoveConfig { name } => {
            if orchestrator.remove_config_set(name, cancel).await? {
                println!("Removed config set {name}");
            }
        }
        Command::InstallConfig { name, force } => {
            let install = orchestrator
                .config_sets()
                .ensure_installed(name, *force, cancel)
                .await?;
            if install.uploaded {
                println!("Uploaded config set {name}");
            } else {
                println!("Config set {name} already deployed");
            }
            warn_summary(name, install.warnings.len());
        }
        Command::Deps { collection } => {
            let (bound, warnings) = orchestrator.ensure_dependencies(collection, cancel).await?;
            for (blob_name, version) in &bound {
                println!("{blob_name} v{version}");
            }
            warn_summary(collection, warnings.len());
        }
        Command::Resolve { coordinate, dest } => {
            fs::create_dir_all(dest, false).await?;
            let resolved = orchestrator
                .resolver()
                .resolve(coordinate, dest, cancel)
                .await?;
            println!("{}", resolved.path.display());
        }
    }

    Ok(0)
}

fn print_report(report: &DeploymentReport) {
    println!(
        "Collection {} uses config set {}{}",
        report.collection,
        report.config_name,
        if report.config_changed { " (changed)" } else { "" }
    );
    for (blob_name, version) in &report.dependencies {
        println!("  runtime lib {blob_name} v{version}");
    }
    warn_summary(&report.collection, report.warnings.len());
}

fn warn_summary(subject: &str, count: usize) {
    if count > 0 {
        log::warn!("{} finished with {} warning(s), see log above", subject, count);
    }
}
