// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Entity
//!
//! An edge is a typed, directed logical connection from one or more source hosts
//! to exactly one target host/service. Host references are weak: they are UUIDs
//! looked up in the paired registry at resolution time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::network::Port;

/// Kind of logical connection an edge describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Database,
    Queue,
    Cluster,
    Telemetry,
    Monitoring,
    Api,
    Storage,
}

impl EdgeType {
    pub const ALL: [EdgeType; 7] = [
        Self::Database,
        Self::Queue,
        Self::Cluster,
        Self::Telemetry,
        Self::Monitoring,
        Self::Api,
        Self::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Queue => "queue",
            Self::Cluster => "cluster",
            Self::Telemetry => "telemetry",
            Self::Monitoring => "monitoring",
            Self::Api => "api",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown edge type: {}", s))
    }
}

/// Edge criticality tier, used to scope health-check batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Critical,
    #[default]
    #[serde(alias = "medium", alias = "high")]
    Standard,
    Low,
}

impl Criticality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Standard => "standard",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "standard" | "medium" | "high" => Ok(Self::Standard),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown criticality: {}", other)),
        }
    }
}

/// Which hosts an edge originates from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHosts {
    /// Every active host in the registry (`"*"`)
    All,
    /// Explicit host UUIDs, in declaration order
    Listed(Vec<Uuid>),
}

/// Label selector matching source hosts by role, service or observability readiness
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Active hosts whose `observability.ready` flag equals this value
    #[serde(
        default,
        rename = "observability.ready",
        skip_serializing_if = "Option::is_none"
    )]
    pub observability_ready: Option<bool>,
}

impl SourceSelector {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.service.is_none() && self.observability_ready.is_none()
    }
}

/// Source side of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeSource {
    pub hosts: SourceHosts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<SourceSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl EdgeSource {
    pub fn is_wildcard(&self) -> bool {
        matches!(self.hosts, SourceHosts::All)
    }

    pub fn listed_hosts(&self) -> &[Uuid] {
        match &self.hosts {
            SourceHosts::Listed(hosts) => hosts,
            SourceHosts::All => &[],
        }
    }
}

/// Target side of an edge: one host, one service, optional port override
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeTarget {
    pub host: Uuid,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
}

/// Authentication scheme an edge expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    #[default]
    None,
    Password,
    Basic,
    Token,
    Certificate,
}

/// Authentication descriptor; only a reference to a secret, never the secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    #[serde(default, rename = "type")]
    pub kind: AuthKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
}

/// Explicit health-check method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMethod {
    Tcp,
    Http,
    Https,
    Ping,
    /// HTTP GET against an API health path (default `/health`)
    Api,
    /// Application-level query; probed as a TCP connect
    Query,
}

impl CheckMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Http => "http",
            Self::Https => "https",
            Self::Ping => "ping",
            Self::Api => "api",
            Self::Query => "query",
        }
    }
}

/// Health-check descriptor: method plus probe parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckSpec {
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub method: Option<CheckMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Deadline as a duration string (`"5s"`, `"500ms"`, `"1m"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    /// Statement for `query` checks; carried, not executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// HTTP verb for HTTP checks (default GET)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Accepted HTTP status codes; empty means any 2xx-3xx
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_status: Vec<u16>,
}

impl HealthCheckSpec {
    /// Per-edge probe deadline: `timeout_secs`, else the `timeout` string
    pub fn deadline(&self) -> Option<Duration> {
        self.timeout_secs
            .map(Duration::from_secs)
            .or_else(|| self.timeout.as_deref().and_then(|t| parse_duration(t).ok()))
    }
}

/// Parse a duration such as `5s`, `500ms`, `1m30s` or `2h`; a bare number is seconds
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration cannot be empty".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = input;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("missing number in duration: '{}'", input));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| format!("invalid number in duration: '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let step = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "" => return Err(format!("missing unit in duration: '{}'", input)),
            other => return Err(format!("unknown unit '{}' in duration: '{}'", other, input)),
        };
        total = total.saturating_add(step);
    }
    Ok(total)
}

/// Edge metadata with free-form extension fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    #[serde(default)]
    pub criticality: Criticality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runbook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Declared connection between infrastructure nodes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) edge_type: EdgeType,
    pub(crate) from: EdgeSource,
    pub(crate) to: EdgeTarget,
    pub(crate) protocol: Option<String>,
    pub(crate) auth: AuthDescriptor,
    pub(crate) health_check: Option<HealthCheckSpec>,
    pub(crate) metadata: EdgeMetadata,
}

impl Edge {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn edge_type(&self) -> EdgeType {
        self.edge_type
    }

    pub fn source(&self) -> &EdgeSource {
        &self.from
    }

    pub fn target(&self) -> &EdgeTarget {
        &self.to
    }

    pub fn target_host(&self) -> Uuid {
        self.to.host
    }

    pub fn target_service(&self) -> &str {
        &self.to.service
    }

    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    pub fn auth(&self) -> &AuthDescriptor {
        &self.auth
    }

    pub fn health_check(&self) -> Option<&HealthCheckSpec> {
        self.health_check.as_ref()
    }

    pub fn metadata(&self) -> &EdgeMetadata {
        &self.metadata
    }

    pub fn criticality(&self) -> Criticality {
        self.metadata.criticality
    }

    pub fn is_critical(&self) -> bool {
        self.metadata.criticality == Criticality::Critical
    }

    /// Whether the given host is a source of this edge by UUID
    ///
    /// Selector-based sources need the registry; see `EdgeResolver::resolve_source_hosts`.
    pub fn matches_source(&self, host: Uuid) -> bool {
        match &self.from.hosts {
            SourceHosts::All => true,
            SourceHosts::Listed(hosts) => hosts.contains(&host),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}: -> {})", self.id, self.edge_type, self.to.service)
    }
}
