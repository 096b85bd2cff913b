// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Resolution
//!
//! Turns a declared edge into something immediately usable: an `address:port`
//! endpoint, a connection URL, or a template context.
//!
//! # Resolution Rules
//!
//! 1. The target host is `to.host` looked up by UUID; a missing or terminated
//!    host is [`InfralinkError::UnresolvedTarget`]
//! 2. The address is the first configured kind in preference order
//!    (overlay, public, private by default), else [`InfralinkError::NoAddress`]
//! 3. The port is `to.port`, else the target service's declared port, else
//!    [`InfralinkError::NoPort`]
//!
//! Nothing is cached: every call reads the registry again.
//!
//! # Example
//!
//! ```rust,ignore
//! let resolver = EdgeResolver::new(&registry, &edges);
//! let endpoint = resolver.get_target_endpoint("app-to-postgres")?;
//! let url = resolver.get_connection_url(
//!     "app-to-postgres",
//!     &UrlOptions::new().user("app").password("s3cret").database("app"),
//! )?;
//! ```

pub mod context;
pub mod url;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{AddressKind, AddressPreference, Edge, Host, HostStatus, NetworkAddress, Port};
use crate::errors::{InfralinkError, InfralinkResult};
use crate::topology::{EdgeSet, HostFilter, Registry};

pub use context::TemplateContext;
pub use url::UrlOptions;

/// Concrete network target of an edge, computed per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEndpoint {
    pub edge_id: String,
    pub host_id: Uuid,
    pub host_name: String,
    pub address_kind: AddressKind,
    pub address: NetworkAddress,
    pub port: Port,
}

impl ResolvedEndpoint {
    /// `address:port`, with IPv6 literals bracketed
    pub fn endpoint(&self) -> String {
        self.address.endpoint(self.port)
    }
}

impl fmt::Display for ResolvedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint())
    }
}

/// One (source host, target endpoint) pair of a multi-source edge
#[derive(Debug, Clone)]
pub struct SourceBinding<'a> {
    pub source: &'a Host,
    pub target: ResolvedEndpoint,
}

/// Outcome of resolving a single edge in a batch
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    pub edge_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionOutcome {
    pub fn is_resolved(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Aggregate counts for a batch resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub total: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Per-edge outcomes plus summary for [`EdgeResolver::resolve_all`]
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub outcomes: Vec<ResolutionOutcome>,
    pub summary: ResolutionSummary,
}

impl ResolutionReport {
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| o.error.as_deref())
    }
}

/// Resolves edge targets against a registry
///
/// Borrows both indices, so they necessarily outlive the resolver. The resolver
/// is `Copy` and holds no state of its own besides the address preference.
#[derive(Debug, Clone, Copy)]
pub struct EdgeResolver<'a> {
    registry: &'a Registry,
    edges: &'a EdgeSet,
    preference: AddressPreference,
}

impl<'a> EdgeResolver<'a> {
    pub fn new(registry: &'a Registry, edges: &'a EdgeSet) -> Self {
        Self {
            registry,
            edges,
            preference: AddressPreference::default(),
        }
    }

    /// Resolve addresses with a different kind first
    pub fn with_preference(mut self, preference: AddressPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    pub fn edges(&self) -> &'a EdgeSet {
        self.edges
    }

    pub fn preference(&self) -> AddressPreference {
        self.preference
    }

    pub fn get_edge(&self, edge_id: &str) -> InfralinkResult<&'a Edge> {
        self.edges.get(edge_id)
    }

    pub fn get_target_host(&self, edge_id: &str) -> InfralinkResult<&'a Host> {
        self.target_host_of(self.get_edge(edge_id)?)
    }

    fn target_host_of(&self, edge: &Edge) -> InfralinkResult<&'a Host> {
        let host = self
            .registry
            .get_by_uuid(edge.target_host())
            .map_err(|_| InfralinkError::UnresolvedTarget {
                edge_id: edge.id().to_string(),
                reason: format!("target host {} not in registry", edge.target_host()),
            })?;

        if !host.status().is_resolvable() {
            return Err(InfralinkError::UnresolvedTarget {
                edge_id: edge.id().to_string(),
                reason: format!("target host {} is {}", host.canonical_name(), host.status()),
            });
        }

        Ok(host)
    }

    pub fn get_target_address(&self, edge_id: &str) -> InfralinkResult<&'a NetworkAddress> {
        let edge = self.get_edge(edge_id)?;
        let host = self.target_host_of(edge)?;
        Self::address_of(edge, host, self.preference).map(|(_, addr)| addr)
    }

    fn address_of(
        edge: &Edge,
        host: &'a Host,
        preference: AddressPreference,
    ) -> InfralinkResult<(AddressKind, &'a NetworkAddress)> {
        host.addresses()
            .select(preference)
            .ok_or_else(|| InfralinkError::NoAddress {
                edge_id: edge.id().to_string(),
                host: host.canonical_name().to_string(),
            })
    }

    pub fn get_target_port(&self, edge_id: &str) -> InfralinkResult<Port> {
        let edge = self.get_edge(edge_id)?;
        let host = self.target_host_of(edge)?;
        Self::port_of(edge, host)
    }

    fn port_of(edge: &Edge, host: &Host) -> InfralinkResult<Port> {
        edge.target()
            .port
            .or_else(|| host.service(edge.target_service()).and_then(|s| s.port))
            .ok_or_else(|| InfralinkError::NoPort {
                edge_id: edge.id().to_string(),
                service: edge.target_service().to_string(),
            })
    }

    /// Resolve an edge to its concrete endpoint
    pub fn resolve(&self, edge_id: &str) -> InfralinkResult<ResolvedEndpoint> {
        self.resolve_edge(self.get_edge(edge_id)?)
    }

    /// Resolve an edge the caller already holds
    pub fn resolve_edge(&self, edge: &Edge) -> InfralinkResult<ResolvedEndpoint> {
        self.resolve_with(edge, self.preference)
    }

    fn resolve_with(
        &self,
        edge: &Edge,
        preference: AddressPreference,
    ) -> InfralinkResult<ResolvedEndpoint> {
        let host = self.target_host_of(edge)?;
        let (address_kind, address) = Self::address_of(edge, host, preference)?;
        let port = Self::port_of(edge, host)?;

        debug!(
            edge = edge.id(),
            host = host.canonical_name(),
            kind = %address_kind,
            "resolved {}:{}",
            address,
            port
        );

        Ok(ResolvedEndpoint {
            edge_id: edge.id().to_string(),
            host_id: host.id(),
            host_name: host.canonical_name().to_string(),
            address_kind,
            address: address.clone(),
            port,
        })
    }

    /// `address:port` for an edge target
    pub fn get_target_endpoint(&self, edge_id: &str) -> InfralinkResult<String> {
        self.resolve(edge_id).map(|r| r.endpoint())
    }

    /// Build a connection URL; the scheme defaults to the edge protocol, then `tcp`
    pub fn get_connection_url(&self, edge_id: &str, options: &UrlOptions) -> InfralinkResult<String> {
        let edge = self.get_edge(edge_id)?;
        let resolved = self.resolve_with(edge, options.preference.unwrap_or(self.preference))?;
        let scheme = options
            .scheme
            .as_deref()
            .or(edge.protocol())
            .unwrap_or("tcp");
        url::render(scheme, &resolved.address, resolved.port, options)
    }

    /// PostgreSQL URL
    ///
    /// The scheme is `driver` when given, else a `postgres*` edge protocol,
    /// else `postgresql+psycopg2`.
    pub fn get_postgres_url(
        &self,
        edge_id: &str,
        user: &str,
        password: &str,
        database: &str,
        driver: Option<&str>,
    ) -> InfralinkResult<String> {
        let scheme = self.preset_scheme(edge_id, driver, &["postgres"], "postgresql+psycopg2")?;
        self.get_connection_url(
            edge_id,
            &UrlOptions::new()
                .scheme(scheme)
                .user(user)
                .password(password)
                .database(database),
        )
    }

    /// MySQL/MariaDB URL; `driver`, else a `mysql*`/`mariadb*` edge protocol,
    /// else `mysql+pymysql`
    pub fn get_mysql_url(
        &self,
        edge_id: &str,
        user: &str,
        password: &str,
        database: &str,
        driver: Option<&str>,
    ) -> InfralinkResult<String> {
        let scheme = self.preset_scheme(edge_id, driver, &["mysql", "mariadb"], "mysql+pymysql")?;
        self.get_connection_url(
            edge_id,
            &UrlOptions::new()
                .scheme(scheme)
                .user(user)
                .password(password)
                .database(database),
        )
    }

    /// Redis URL with optional password and database index
    pub fn get_redis_url(
        &self,
        edge_id: &str,
        password: Option<&str>,
        db: u32,
    ) -> InfralinkResult<String> {
        let scheme = self.preset_scheme(edge_id, None, &["rediss", "redis"], "redis")?;
        let mut options = UrlOptions::new().scheme(scheme).database(db.to_string());
        if let Some(password) = password {
            options = options.password(password);
        }
        self.get_connection_url(edge_id, &options)
    }

    fn preset_scheme(
        &self,
        edge_id: &str,
        driver: Option<&str>,
        families: &[&str],
        fallback: &str,
    ) -> InfralinkResult<String> {
        let edge = self.get_edge(edge_id)?;
        if let Some(driver) = driver.map(str::trim).filter(|d| !d.is_empty()) {
            return Ok(driver.to_string());
        }
        Ok(edge
            .protocol()
            .filter(|p| {
                let p = p.to_ascii_lowercase();
                families.iter().any(|f| p.starts_with(f))
            })
            .unwrap_or(fallback)
            .to_string())
    }

    /// Template variables for an edge; never contains a password
    pub fn get_template_context(&self, edge_id: &str) -> InfralinkResult<TemplateContext> {
        let edge = self.get_edge(edge_id)?;
        let resolved = self.resolve_edge(edge)?;
        let host = self.target_host_of(edge)?;

        let mut ctx = TemplateContext::default();
        ctx.insert("edge_id", edge.id());
        ctx.insert("edge_type", edge.edge_type().as_str());
        ctx.insert("address", resolved.address.as_str());
        ctx.insert("address_kind", resolved.address_kind.as_str());
        ctx.insert("port", resolved.port.value());
        ctx.insert("endpoint", resolved.endpoint());
        ctx.insert("target_service", edge.target_service());
        ctx.insert("target_host_name", host.canonical_name());
        ctx.insert("target_host_uuid", host.id().to_string());
        ctx.insert_opt(
            "target_public_ip",
            host.address(AddressKind::Public).map(|a| a.as_str()),
        );
        ctx.insert_opt("protocol", edge.protocol());

        let meta = edge.metadata();
        ctx.insert("criticality", meta.criticality.as_str());
        ctx.insert_opt("purpose", meta.purpose.as_deref());
        ctx.insert_opt("owner", meta.owner.as_deref());
        ctx.insert_opt("runbook", meta.runbook.as_deref());
        ctx.insert_opt("documentation", meta.documentation.as_deref());

        for (key, value) in &meta.extra {
            if context::is_secret_key(key) || ctx.contains_key(key) {
                continue;
            }
            ctx.insert(key, value.clone());
        }

        Ok(ctx)
    }

    /// Template variables plus `password`, taken from caller-supplied secrets
    ///
    /// The password is added only when the edge declares `auth.secret_ref` and
    /// `secrets` holds that reference.
    pub fn get_template_context_with_secrets(
        &self,
        edge_id: &str,
        secrets: &HashMap<String, String>,
    ) -> InfralinkResult<TemplateContext> {
        let mut ctx = self.get_template_context(edge_id)?;
        let edge = self.get_edge(edge_id)?;
        if let Some(secret) = edge
            .auth()
            .secret_ref
            .as_deref()
            .and_then(|r| secrets.get(r))
        {
            ctx.insert("password", secret.as_str());
        }
        Ok(ctx)
    }

    /// All source hosts of an edge
    ///
    /// Explicit host lists win; otherwise the label selector applies (all of
    /// role, service and `observability.ready` that are set); a bare
    /// wildcard means every active host. Listed UUIDs missing from the registry
    /// are skipped.
    pub fn resolve_source_hosts(&self, edge_id: &str) -> InfralinkResult<Vec<&'a Host>> {
        let edge = self.get_edge(edge_id)?;
        let source = edge.source();

        if !source.listed_hosts().is_empty() {
            return Ok(source
                .listed_hosts()
                .iter()
                .filter_map(|id| match self.registry.get_by_uuid(*id) {
                    Ok(host) => Some(host),
                    Err(_) => {
                        debug!(edge = edge.id(), host = %id, "source host not in registry");
                        None
                    }
                })
                .collect());
        }

        if let Some(selector) = &source.selector {
            let filter = HostFilter {
                role: selector.role.clone(),
                service: selector.service.clone(),
                observability_ready: selector.observability_ready,
                // Readiness selects among active hosts only
                status: selector.observability_ready.map(|_| HostStatus::Active),
                ..HostFilter::default()
            };
            return Ok(self.registry.filter(&filter));
        }

        if source.is_wildcard() {
            return Ok(self.registry.active_hosts());
        }

        Ok(Vec::new())
    }

    /// One binding per source host, all sharing the edge's single target
    pub fn source_bindings(&self, edge_id: &str) -> InfralinkResult<Vec<SourceBinding<'a>>> {
        let target = self.resolve(edge_id)?;
        Ok(self
            .resolve_source_hosts(edge_id)?
            .into_iter()
            .map(|source| SourceBinding {
                source,
                target: target.clone(),
            })
            .collect())
    }

    /// Resolve every edge; failures are reported per edge, never raised
    pub fn resolve_all(&self) -> ResolutionReport {
        let outcomes: Vec<ResolutionOutcome> = self
            .edges
            .iter()
            .map(|edge| match self.resolve_edge(edge) {
                Ok(resolved) => ResolutionOutcome {
                    edge_id: edge.id().to_string(),
                    endpoint: Some(resolved.endpoint()),
                    error: None,
                },
                Err(e) => {
                    warn!(edge = edge.id(), error = %e, "edge cannot be resolved");
                    ResolutionOutcome {
                        edge_id: edge.id().to_string(),
                        endpoint: None,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();

        let resolved = outcomes.iter().filter(|o| o.is_resolved()).count();
        let summary = ResolutionSummary {
            total: outcomes.len(),
            resolved,
            failed: outcomes.len() - resolved,
        };

        ResolutionReport { outcomes, summary }
    }
}
