// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology loading and edge resolution

use thiserror::Error;

use crate::domain::NetworkError;

/// Errors that can occur while building or resolving the topology
#[derive(Debug, Error)]
pub enum InfralinkError {
    /// Malformed or inconsistent declaration, fatal to the load
    #[error("Schema error: {0}")]
    Schema(String),

    /// Lookup of an unknown host or edge
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Edge target host is missing from the registry or terminated
    #[error("Unresolved target for edge {edge_id}: {reason}")]
    UnresolvedTarget { edge_id: String, reason: String },

    /// Target host has no configured address of any kind
    #[error("No address available for edge {edge_id} target: {host}")]
    NoAddress { edge_id: String, host: String },

    /// Neither the edge nor the target service declares a port
    #[error("No port available for edge {edge_id}: service {service} declares none")]
    NoPort { edge_id: String, service: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error while reading declarations or configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for topology and resolution operations
pub type InfralinkResult<T> = Result<T, InfralinkError>;

impl InfralinkError {
    pub(crate) fn host_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Host",
            id: id.into(),
        }
    }

    pub(crate) fn edge_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "Edge",
            id: id.into(),
        }
    }

    /// True for the per-edge resolution failures that must not abort a batch
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedTarget { .. } | Self::NoAddress { .. } | Self::NoPort { .. }
        )
    }
}

impl From<NetworkError> for InfralinkError {
    fn from(err: NetworkError) -> Self {
        InfralinkError::Schema(err.to_string())
    }
}
