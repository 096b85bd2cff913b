// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Immutable value types for hosts, their services and addresses, and the typed
//! edges connecting them.
//!
//! # Value Objects with Invariants
//!
//! - [`Port`] - TCP/UDP port (1-65535)
//! - [`NetworkAddress`] - IP literal or RFC 1123 hostname
//! - [`HostAddresses`] - at most one address per [`AddressKind`]
//!
//! # Entities
//!
//! - [`Host`] - UUID-identified infrastructure node
//! - [`Edge`] - typed, directed connection to one target host/service

pub mod edge;
pub mod host;
pub mod network;

pub use edge::{
    AuthDescriptor, AuthKind, CheckMethod, Criticality, Edge, EdgeMetadata, EdgeSource,
    EdgeTarget, EdgeType, HealthCheckSpec, SourceHosts, SourceSelector,
};
pub use host::{Exposure, Host, HostStatus, Observability, Service};
pub use network::{
    AddressKind, AddressPreference, HostAddresses, NetworkAddress, NetworkError, Port,
};
