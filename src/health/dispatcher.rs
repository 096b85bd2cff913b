// Copyright (c) 2025 - Cowboy AI, Inc.
//! Health Check Dispatcher
//!
//! Resolves an edge, picks its probe, runs it under a deadline and normalizes
//! whatever happened into a [`HealthCheckResult`]. Nothing here returns an
//! error: unreachable targets, unresolvable edges and timeouts are all results.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Method};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::CheckConfig;
use crate::domain::{Criticality, Edge, EdgeType};
use crate::errors::{InfralinkError, InfralinkResult};
use crate::resolver::{url, EdgeResolver, ResolvedEndpoint, UrlOptions};

use super::probe::{http_client, HttpProbe, PingProbe, Probe, TcpProbe};
use super::result::{
    CheckPhase, CheckReport, FailureKind, HealthCheckResult, ProbeError, RESOLUTION_CHECK,
};
use super::strategy::{check_label, http_path, select_check_kind, CheckKind};

/// Batch check tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Per-probe deadline unless the edge declares its own
    pub timeout: Duration,
    /// Maximum probes in flight
    pub concurrency: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            concurrency: 16,
        }
    }
}

impl From<&CheckConfig> for CheckOptions {
    fn from(config: &CheckConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            concurrency: config.concurrency,
        }
    }
}

/// Which edges a batch check covers; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeFilter {
    pub critical_only: bool,
    pub edge_type: Option<EdgeType>,
    pub criticality: Option<Criticality>,
    pub ids: Vec<String>,
}

impl EdgeFilter {
    pub fn critical_only() -> Self {
        Self {
            critical_only: true,
            ..Self::default()
        }
    }

    pub fn edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = Some(edge_type);
        self
    }

    pub fn criticality(mut self, criticality: Criticality) -> Self {
        self.criticality = Some(criticality);
        self
    }

    pub fn ids(mut self, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, edge: &Edge) -> bool {
        (!self.critical_only || edge.is_critical())
            && self.edge_type.map_or(true, |t| edge.edge_type() == t)
            && self.criticality.map_or(true, |c| edge.criticality() == c)
            && (self.ids.is_empty() || self.ids.iter().any(|id| id == edge.id()))
    }
}

/// Runs health checks against resolved edges
///
/// Holds one HTTP client for all HTTP probes; cheap to clone.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    http: Client,
    options: CheckOptions,
}

impl HealthChecker {
    pub fn new(options: CheckOptions) -> InfralinkResult<Self> {
        let http = http_client()
            .map_err(|e| InfralinkError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Check one edge
    pub async fn check_edge(&self, resolver: &EdgeResolver<'_>, edge: &Edge) -> HealthCheckResult {
        let phase = CheckPhase::Pending;
        debug!(edge = edge.id(), ?phase, "health check");

        let resolved = match resolver.resolve_edge(edge) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(edge = edge.id(), error = %e, "cannot resolve edge for health check");
                return errored(
                    edge,
                    phase,
                    RESOLUTION_CHECK,
                    None,
                    Some(FailureKind::Unresolved),
                    e.to_string(),
                );
            }
        };

        let kind = select_check_kind(edge);
        let check = check_label(edge, kind);
        let endpoint = resolved.endpoint();
        let probe = match self.build_probe(resolver, edge, kind, &resolved) {
            Ok(probe) => probe,
            Err(e) => return errored(edge, phase, check, Some(endpoint), None, e.to_string()),
        };

        let timeout = edge
            .health_check()
            .and_then(|hc| hc.deadline())
            .unwrap_or(self.options.timeout);

        let phase = phase.advance(CheckPhase::Running);
        debug!(edge = edge.id(), ?phase, check, probe = %probe.kind(), %endpoint, ?timeout, "probing");

        let started = Instant::now();
        let outcome = match tokio::time::timeout(timeout, probe.check()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::Timeout(format!("{} after {:?}", endpoint, timeout))),
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let mut result = HealthCheckResult {
            edge_id: edge.id().to_string(),
            edge_type: edge.edge_type(),
            criticality: edge.criticality(),
            check: check.to_string(),
            target_endpoint: Some(endpoint),
            phase,
            healthy: false,
            latency_ms: Some(latency_ms),
            failure: None,
            error: None,
            note: None,
            checked_at: Utc::now(),
        };

        match outcome {
            Ok(note) => {
                result.phase = phase.advance(CheckPhase::Healthy);
                result.healthy = true;
                result.note = note;
            }
            Err(e) => {
                warn!(edge = edge.id(), check, failure = %e.kind(), error = %e, "edge unhealthy");
                result.phase = phase.advance(CheckPhase::Unhealthy);
                result.failure = Some(e.kind());
                result.error = Some(e.to_string());
            }
        }

        result
    }

    fn build_probe(
        &self,
        resolver: &EdgeResolver<'_>,
        edge: &Edge,
        kind: CheckKind,
        resolved: &ResolvedEndpoint,
    ) -> InfralinkResult<Box<dyn Probe>> {
        let host = resolved.address.as_str().to_string();
        let port = resolved.port.value();

        match kind {
            CheckKind::Tcp => Ok(Box::new(TcpProbe::new(host, port))),
            CheckKind::Ping => Ok(Box::new(PingProbe::new(host, port))),
            CheckKind::Http | CheckKind::Https => {
                let service = resolver
                    .registry()
                    .get_by_uuid(resolved.host_id)
                    .ok()
                    .and_then(|h| h.service(edge.target_service()));
                let path = http_path(edge, service);
                let url = url::render(
                    kind.as_str(),
                    &resolved.address,
                    resolved.port,
                    &UrlOptions::new().path(path),
                )?;

                let spec = edge.health_check();
                let method = match spec.and_then(|hc| hc.http_method.as_deref()) {
                    Some(m) => Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|_| {
                        InfralinkError::Schema(format!("invalid HTTP method for {}: {}", edge.id(), m))
                    })?,
                    None => Method::GET,
                };

                let probe = HttpProbe::new(self.http.clone(), method, url, kind == CheckKind::Https)
                    .expect_status(spec.map(|hc| hc.expected_status.clone()).unwrap_or_default());
                Ok(Box::new(probe))
            }
        }
    }

    /// Check edges concurrently; results come back in input order
    pub async fn check_edges<'e>(
        &self,
        resolver: &EdgeResolver<'_>,
        edges: impl IntoIterator<Item = &'e Edge>,
    ) -> Vec<HealthCheckResult> {
        stream::iter(edges)
            .map(|edge| self.check_edge(resolver, edge))
            .buffered(self.options.concurrency.max(1))
            .collect()
            .await
    }

    /// Check every edge matching `filter`
    pub async fn check_all(&self, resolver: &EdgeResolver<'_>, filter: &EdgeFilter) -> CheckReport {
        let edges: Vec<&Edge> = resolver.edges().iter().filter(|e| filter.matches(e)).collect();
        let report = CheckReport::new(self.check_edges(resolver, edges).await);

        info!(
            total = report.summary.total,
            healthy = report.summary.healthy,
            critical_failures = report.summary.critical_failures,
            "health check complete"
        );
        report
    }
}

fn errored(
    edge: &Edge,
    from: CheckPhase,
    check: &str,
    endpoint: Option<String>,
    failure: Option<FailureKind>,
    error: String,
) -> HealthCheckResult {
    HealthCheckResult {
        edge_id: edge.id().to_string(),
        edge_type: edge.edge_type(),
        criticality: edge.criticality(),
        check: check.to_string(),
        target_endpoint: endpoint,
        phase: from.advance(CheckPhase::Errored),
        healthy: false,
        latency_ms: None,
        failure,
        error: Some(error),
        note: None,
        checked_at: Utc::now(),
    }
}

/// Check a single edge with a one-off checker
pub async fn check_edge_health(
    edge: &Edge,
    resolver: &EdgeResolver<'_>,
    timeout: Duration,
) -> HealthCheckResult {
    let options = CheckOptions {
        timeout,
        ..CheckOptions::default()
    };
    match HealthChecker::new(options) {
        Ok(checker) => checker.check_edge(resolver, edge).await,
        Err(e) => errored(
            edge,
            CheckPhase::Pending,
            check_label(edge, select_check_kind(edge)),
            None,
            None,
            e.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{EdgeSet, EdgeSetDeclaration, Registry};
    use serde_json::json;

    fn edge(id: &str, criticality: &str, edge_type: &str) -> serde_json::Value {
        json!({
            "id": id,
            "type": edge_type,
            "from": { "hosts": "*" },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "svc", "port": 1 },
            "metadata": { "criticality": criticality }
        })
    }

    #[test]
    fn test_edge_filter() {
        let decl: EdgeSetDeclaration = serde_json::from_value(json!({
            "edges": [
                edge("a", "critical", "database"),
                edge("b", "low", "database"),
                edge("c", "critical", "api"),
            ]
        }))
        .unwrap();
        let set = EdgeSet::from_declaration(decl).unwrap();

        let ids = |f: &EdgeFilter| -> Vec<String> {
            set.iter().filter(|e| f.matches(e)).map(|e| e.id().to_string()).collect()
        };

        assert_eq!(ids(&EdgeFilter::critical_only()), vec!["a", "c"]);
        assert_eq!(ids(&EdgeFilter::default().edge_type(EdgeType::Database)), vec!["a", "b"]);
        assert_eq!(ids(&EdgeFilter::critical_only().edge_type(EdgeType::Api)), vec!["c"]);
        assert_eq!(ids(&EdgeFilter::default().ids(["b"])), vec!["b"]);
        assert_eq!(ids(&EdgeFilter::default().criticality(Criticality::Low)), vec!["b"]);
    }

    #[tokio::test]
    async fn test_unresolvable_edge_is_a_result() {
        let registry = Registry::default();
        let decl: EdgeSetDeclaration = serde_json::from_value(json!({
            "edges": [edge("orphan", "critical", "database")]
        }))
        .unwrap();
        let edges = EdgeSet::from_declaration(decl).unwrap();
        let resolver = EdgeResolver::new(&registry, &edges);

        let result =
            check_edge_health(edges.get("orphan").unwrap(), &resolver, Duration::from_secs(1)).await;

        assert!(!result.healthy);
        assert_eq!(result.phase, CheckPhase::Errored);
        assert_eq!(result.check, "resolution");
        assert_eq!(result.failure, Some(FailureKind::Unresolved));
        assert!(result.target_endpoint.is_none());
        assert!(result.is_critical_failure());
    }
}
