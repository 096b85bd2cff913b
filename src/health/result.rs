// Copyright (c) 2025 - Cowboy AI, Inc.
//! Health Check Results
//!
//! Every check, whatever went wrong, ends in a [`HealthCheckResult`] value.
//! Probe failures are classified into a [`FailureKind`] so callers can react
//! without parsing error strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{Criticality, EdgeType};

/// Lifecycle of a single check invocation
///
/// `Pending -> Running -> {Healthy, Unhealthy}`; `Errored` is reachable from
/// `Pending` when the edge cannot be resolved or probed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckPhase {
    Pending,
    Running,
    Healthy,
    Unhealthy,
    Errored,
}

impl CheckPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Healthy | Self::Unhealthy | Self::Errored)
    }

    /// Whether `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CheckPhase) -> bool {
        use CheckPhase::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Errored) | (Running, Healthy) | (Running, Unhealthy)
        )
    }

    /// Move to `next`; an illegal transition is a bug in the dispatcher
    pub fn advance(self, next: CheckPhase) -> CheckPhase {
        debug_assert!(
            self.can_transition_to(next),
            "illegal check phase transition {:?} -> {:?}",
            self,
            next
        );
        next
    }
}

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    ConnectionRefused,
    Timeout,
    DnsError,
    BadStatus,
    UnexpectedResponse,
    NetworkError,
    /// The edge could not be resolved to an endpoint
    Unresolved,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRefused => "connection-refused",
            Self::Timeout => "timeout",
            Self::DnsError => "dns-error",
            Self::BadStatus => "bad-status",
            Self::UnexpectedResponse => "unexpected-response",
            Self::NetworkError => "network-error",
            Self::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a probe failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Connection refused: {endpoint}")]
    ConnectionRefused { endpoint: String },

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("DNS resolution failed for {host}: {reason}")]
    Dns { host: String, reason: String },

    #[error("HTTP {0}")]
    BadStatus(u16),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProbeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ConnectionRefused { .. } => FailureKind::ConnectionRefused,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::Dns { .. } => FailureKind::DnsError,
            Self::BadStatus(_) => FailureKind::BadStatus,
            Self::UnexpectedResponse(_) => FailureKind::UnexpectedResponse,
            Self::Network(_) => FailureKind::NetworkError,
        }
    }
}

/// Check label used when resolution failed before any probe ran
pub const RESOLUTION_CHECK: &str = "resolution";

/// Outcome of checking one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub edge_id: String,
    pub edge_type: EdgeType,
    pub criticality: Criticality,
    /// Strategy that ran (`tcp`, `http`, `https`, `ping`) or `resolution`
    pub check: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_endpoint: Option<String>,
    pub phase: CheckPhase,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Informational note on a healthy result (e.g. auth required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn is_critical(&self) -> bool {
        self.criticality == Criticality::Critical
    }

    /// Non-healthy result on a critical edge
    pub fn is_critical_failure(&self) -> bool {
        !self.healthy && self.is_critical()
    }

    /// One-line human summary
    pub fn status_line(&self) -> String {
        let endpoint = self.target_endpoint.as_deref().unwrap_or("unknown");
        let mark = if self.healthy { "OK  " } else { "FAIL" };
        let mut line = format!("{} {} [{}] {} -> {}", mark, self.edge_id, self.check, self.edge_type, endpoint);
        if let Some(ms) = self.latency_ms {
            line.push_str(&format!(" ({:.1}ms)", ms));
        }
        if let Some(error) = self.error.as_deref().or(self.note.as_deref()) {
            line.push_str(&format!(": {}", error));
        }
        line
    }
}

/// Aggregate counts over a batch of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub errored: usize,
    pub critical_failures: usize,
}

impl CheckSummary {
    pub fn from_results(results: &[HealthCheckResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.phase {
                CheckPhase::Healthy => acc.healthy += 1,
                CheckPhase::Errored => acc.errored += 1,
                _ => acc.unhealthy += 1,
            }
            if r.is_critical_failure() {
                acc.critical_failures += 1;
            }
            acc
        })
    }

    pub fn all_healthy(&self) -> bool {
        self.healthy == self.total
    }

    /// Process exit code: 0 all healthy, 2 any critical failure, else 1
    pub fn exit_code(&self) -> i32 {
        if self.critical_failures > 0 {
            2
        } else if !self.all_healthy() {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for CheckSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} healthy, {} unhealthy, {} errored, {} critical failures",
            self.healthy, self.total, self.unhealthy, self.errored, self.critical_failures
        )
    }
}

/// Results of a batch check, in input order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub results: Vec<HealthCheckResult>,
    pub summary: CheckSummary,
}

impl CheckReport {
    pub fn new(results: Vec<HealthCheckResult>) -> Self {
        let summary = CheckSummary::from_results(&results);
        Self { results, summary }
    }

    pub fn failures(&self) -> impl Iterator<Item = &HealthCheckResult> {
        self.results.iter().filter(|r| !r.healthy)
    }

    pub fn exit_code(&self) -> i32 {
        self.summary.exit_code()
    }
}
