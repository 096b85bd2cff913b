// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Health Checks
//!
//! ## Types
//!
//! - [`Probe`]: uniform async check over TCP, HTTP(S) and RESP `PING`
//! - [`HealthChecker`]: resolves, dispatches and times a probe per edge
//! - [`HealthCheckResult`]: normalized outcome, never an error
//!
//! Batch checks run concurrently with a bounded number of probes in flight and
//! return results in edge declaration order.

pub mod dispatcher;
pub mod probe;
pub mod result;
pub mod strategy;

pub use dispatcher::{check_edge_health, CheckOptions, EdgeFilter, HealthChecker};
pub use probe::{HttpProbe, PingProbe, Probe, TcpProbe};
pub use result::{
    CheckPhase, CheckReport, CheckSummary, FailureKind, HealthCheckResult, ProbeError,
};
pub use strategy::{default_check_kind, select_check_kind, CheckKind};
