//! Node store command line tool.
//!
//! Operational entry point for the Elasticsearch node store: template
//! bootstrap, retention sweeps, health checks and single-node access.

mod config;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use elastic_nodestore::backends::elasticsearch::ElasticNodeStorage;
use elastic_nodestore::{Backend, NodeStorage, parse_cutoff};
use tokio::io::AsyncReadExt;
use tracing::info;

use config::{CliConfig, Command};

/// Initializes logging to stderr; stdout carries command output.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("elastic_nodestore={},nodestore={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(2);
    }

    info!(
        nodes = ?config.node_list(),
        alias = %config.alias,
        index = %config.index,
        "Connecting to Elasticsearch"
    );
    let storage =
        ElasticNodeStorage::from_connection(&config.connection_config(), config.store_config())
            .await
            .context("Failed to create node store")?;

    match config.command {
        Command::Bootstrap => {
            storage.bootstrap().await?;
            println!("template '{}' ready", config.template);
        }
        Command::Cleanup {
            cutoff,
            older_than,
            dry_run,
        } => {
            let input = cutoff.or(older_than).unwrap_or_default();
            let cutoff = parse_cutoff(&input, chrono::Utc::now())?;
            if dry_run {
                plan_cleanup(&storage, cutoff).await?;
            } else {
                run_cleanup(&storage, cutoff).await?;
            }
        }
        Command::Health => {
            storage.health_check().await?;
            println!("ok");
        }
        Command::Get { id } => match storage.get_bytes(&id).await {
            Some(bytes) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&bytes)?;
                stdout.flush()?;
            }
            None => {
                eprintln!("node '{}' not found", id);
                std::process::exit(1);
            }
        },
        Command::Set { id, file } => {
            let payload = match file {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin().read_to_end(&mut buf).await?;
                    buf
                }
            };
            storage.set_bytes(&id, &payload).await?;
            info!(
                doc_id = %id,
                size = payload.len(),
                index = %storage.write_index(),
                "Node stored"
            );
        }
        Command::Delete { ids } => {
            if let [id] = ids.as_slice() {
                storage.delete(id).await?;
            } else {
                storage.delete_multi(&ids).await?;
            }
        }
    }

    Ok(())
}

/// Prints the partitions a sweep at `cutoff` would delete.
async fn plan_cleanup(
    storage: &ElasticNodeStorage,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<()> {
    let plan = storage.retention_plan(cutoff).await?;
    if !plan.alias_found {
        println!(
            "alias '{}' not found; nothing to delete",
            storage.config().alias_name
        );
        return Ok(());
    }

    for partition in &plan.expired {
        println!("would delete {} ({})", partition.name, partition.date);
    }
    for skipped in &plan.skipped {
        println!("would skip {}: {}", skipped.name, skipped.reason);
    }
    println!(
        "{} checked, {} expired, {} kept, {} skipped (cutoff {})",
        plan.checked(),
        plan.expired.len(),
        plan.kept.len(),
        plan.skipped.len(),
        cutoff.to_rfc3339()
    );
    Ok(())
}

/// Runs the sweep and prints the report as JSON.
async fn run_cleanup(
    storage: &ElasticNodeStorage,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> anyhow::Result<()> {
    let report = storage.cleanup(cutoff).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failed > 0 {
        anyhow::bail!("{} partition(s) could not be deleted", report.failed);
    }
    Ok(())
}
