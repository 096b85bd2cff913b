// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge resolution and health checking for declared infrastructure topologies
//!
//! Hosts are immutable, UUID-identified nodes; edges are typed, directed
//! connections between them. This crate resolves an edge to a concrete
//! endpoint or connection URL at the moment it is asked, and health-checks
//! edges with a protocol-appropriate probe.
//!
//! ```rust,ignore
//! use infralink::{EdgeResolver, EdgeSet, Registry};
//!
//! let registry = Registry::from_declaration(RegistryDeclaration::from_json_file("registry.json")?)?;
//! let edges = EdgeSet::from_declaration(EdgeSetDeclaration::from_json_file("edges.json")?)?;
//! let resolver = EdgeResolver::new(&registry, &edges);
//!
//! assert_eq!(resolver.get_target_endpoint("app-to-postgres")?, "100.78.109.111:5432");
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod health;
pub mod resolver;
pub mod topology;

// Re-export commonly used types
pub use config::{CheckConfig, InfralinkConfig};
pub use domain::{AddressPreference, Criticality, Edge, EdgeType, Host, HostStatus};
pub use errors::{InfralinkError, InfralinkResult};
pub use health::{
    check_edge_health, CheckOptions, CheckReport, CheckSummary, EdgeFilter, HealthCheckResult,
    HealthChecker,
};
pub use resolver::{EdgeResolver, ResolvedEndpoint, TemplateContext, UrlOptions};
pub use topology::{EdgeSet, EdgeSetDeclaration, HostFilter, Registry, RegistryDeclaration};
