// Copyright (c) 2025 - Cowboy AI, Inc.
//! Check Strategy Selection
//!
//! Pure mapping from an edge to the probe that should be run against it. An
//! explicit `health_check.method` always wins; otherwise the default table over
//! `(edge type, protocol)` applies.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{CheckMethod, Edge, EdgeType, Service};

/// Probe strategy run against a resolved endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Tcp,
    Http,
    Https,
    /// RESP `PING` (Redis and compatible servers)
    Ping,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Http => "http",
            Self::Https => "https",
            Self::Ping => "ping",
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http | Self::Https)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const REDIS_LIKE: [&str; 4] = ["redis", "rediss", "valkey", "keydb"];
const SQL_LIKE: [&str; 7] = [
    "postgres", "mysql", "mariadb", "mssql", "sqlserver", "oracle", "cockroach",
];

/// Protocol family without a driver suffix (`postgresql+psycopg2` -> `postgresql`)
fn family(protocol: &str) -> String {
    protocol
        .split('+')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub(crate) fn is_redis_like(protocol: &str) -> bool {
    REDIS_LIKE.contains(&family(protocol).as_str())
}

pub(crate) fn is_sql_like(protocol: &str) -> bool {
    let family = family(protocol);
    SQL_LIKE.iter().any(|p| family.starts_with(p))
}

pub(crate) fn is_https_like(protocol: &str) -> bool {
    family(protocol).starts_with("https")
}

/// Default strategy for an edge without an explicit health-check method
pub fn default_check_kind(edge_type: EdgeType, protocol: Option<&str>) -> CheckKind {
    use EdgeType::*;

    match (edge_type, protocol) {
        (Database | Queue | Cluster | Storage, Some(p)) if is_redis_like(p) => CheckKind::Ping,
        (Monitoring | Telemetry | Api, Some(p)) if is_https_like(p) => CheckKind::Https,
        (Monitoring | Telemetry | Api, _) => CheckKind::Http,
        (Database, Some(p)) if is_sql_like(p) => CheckKind::Tcp,
        _ => CheckKind::Tcp,
    }
}

/// Strategy for an explicit method; `api` is HTTP unless the protocol is TLS
pub fn kind_for_method(method: CheckMethod, protocol: Option<&str>) -> CheckKind {
    match method {
        CheckMethod::Tcp => CheckKind::Tcp,
        CheckMethod::Http => CheckKind::Http,
        CheckMethod::Https => CheckKind::Https,
        CheckMethod::Ping => CheckKind::Ping,
        CheckMethod::Api if protocol.is_some_and(is_https_like) => CheckKind::Https,
        CheckMethod::Api => CheckKind::Http,
        CheckMethod::Query => CheckKind::Tcp,
    }
}

/// Strategy the dispatcher runs for an edge
pub fn select_check_kind(edge: &Edge) -> CheckKind {
    match edge.health_check().and_then(|hc| hc.method) {
        Some(method) => kind_for_method(method, edge.protocol()),
        None => default_check_kind(edge.edge_type(), edge.protocol()),
    }
}

/// Check name reported in results
///
/// An explicit `api` method keeps its own name; everything else reports the
/// probe actually run (a `query` check reports `tcp`).
pub fn check_label(edge: &Edge, kind: CheckKind) -> &'static str {
    match edge.health_check().and_then(|hc| hc.method) {
        Some(CheckMethod::Api) => CheckMethod::Api.as_str(),
        _ => kind.as_str(),
    }
}

/// Request path for HTTP checks
///
/// `health_check.path`, then the target service's `healthcheck_path`, then
/// `/health` for the `api` method and edge type, else `/`.
pub fn http_path(edge: &Edge, service: Option<&Service>) -> String {
    let explicit = edge
        .health_check()
        .and_then(|hc| hc.path.as_deref())
        .or_else(|| service.and_then(|s| s.healthcheck_path.as_deref()))
        .filter(|p| !p.trim().is_empty());

    let path = match explicit {
        Some(path) => path.trim().to_string(),
        None => {
            let api = edge.edge_type() == EdgeType::Api
                || edge.health_check().and_then(|hc| hc.method) == Some(CheckMethod::Api);
            if api { "/health" } else { "/" }.to_string()
        }
    };

    if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    }
}
