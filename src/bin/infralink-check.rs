// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Health Check
//!
//! Loads the host registry and edge set, checks every selected edge and exits
//! with 0 when all are healthy, 2 when a critical edge failed, 1 otherwise.
//!
//! Run with: cargo run --bin infralink-check [config.json]
//!
//! Without a config file, settings come from the environment:
//! - `INFRALINK_REGISTRY` registry JSON (default `registry.json`)
//! - `INFRALINK_EDGES` edge set JSON (default: edges embedded in the registry)
//! - `INFRALINK_TIMEOUT_SECS`, `INFRALINK_CONCURRENCY`, `INFRALINK_CRITICAL_ONLY`

use anyhow::{Context, Result};
use infralink::{
    EdgeFilter, EdgeResolver, EdgeSet, EdgeSetDeclaration, HealthChecker, InfralinkConfig,
    Registry, RegistryDeclaration,
};
use std::process::ExitCode;
use tracing::info;

fn load_config() -> Result<InfralinkConfig> {
    match std::env::args().nth(1) {
        Some(path) => InfralinkConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config from {}", path)),
        None => InfralinkConfig::from_env().context("Invalid INFRALINK_* environment"),
    }
}

fn load_topology(config: &InfralinkConfig) -> Result<(Registry, EdgeSet)> {
    let registry_decl = RegistryDeclaration::from_json_file(&config.registry_path)
        .with_context(|| format!("Failed to read registry {}", config.registry_path.display()))?;

    let edge_decl = match &config.edges_path {
        Some(path) => EdgeSetDeclaration::from_json_file(path)
            .with_context(|| format!("Failed to read edges {}", path.display()))?,
        None => EdgeSetDeclaration::from_registry(&registry_decl),
    };

    let registry = Registry::from_declaration(registry_decl).context("Invalid registry")?;
    let edges = EdgeSet::from_declaration(edge_decl).context("Invalid edge set")?;
    Ok((registry, edges))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    info!(
        registry = %config.registry_path.display(),
        timeout_secs = config.check.timeout_secs,
        concurrency = config.check.concurrency,
        critical_only = config.check.critical_only,
        "configuration loaded"
    );

    let (registry, edges) = load_topology(&config)?;
    info!(hosts = registry.len(), edges = edges.len(), "topology loaded");

    let resolver =
        EdgeResolver::new(&registry, &edges).with_preference(config.check.address_preference);
    let checker = HealthChecker::new((&config.check).into())?;
    let filter = EdgeFilter {
        critical_only: config.check.critical_only,
        ..EdgeFilter::default()
    };

    let report = checker.check_all(&resolver, &filter).await;

    for result in &report.results {
        println!("{}", result.status_line());
    }
    println!();
    println!("{}", report.summary);

    // exit_code is always 0, 1 or 2
    Ok(ExitCode::from(report.exit_code() as u8))
}
