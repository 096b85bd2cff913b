// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edge Set
//!
//! In-memory index over declared edges. Every query returns edges in
//! declaration order.

use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Criticality, Edge, EdgeType};
use crate::errors::{InfralinkError, InfralinkResult};

use super::declaration::EdgeSetDeclaration;

/// Collection of infrastructure edges
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<Edge>,
    by_id: HashMap<String, usize>,
    schema_version: String,
}

impl EdgeSet {
    /// Build the edge set from declarations
    ///
    /// # Errors
    /// [`InfralinkError::Schema`] on a duplicate edge id or an invalid declaration.
    pub fn from_declaration(declaration: EdgeSetDeclaration) -> InfralinkResult<Self> {
        let edges = declaration
            .edges
            .into_iter()
            .map(|decl| decl.into_edge())
            .collect::<InfralinkResult<Vec<_>>>()?;
        Self::new(edges, declaration.schema_version)
    }

    /// Build from already-validated edges
    pub fn new(edges: Vec<Edge>, schema_version: impl Into<String>) -> InfralinkResult<Self> {
        let mut by_id = HashMap::with_capacity(edges.len());
        for (idx, edge) in edges.iter().enumerate() {
            if by_id.insert(edge.id().to_string(), idx).is_some() {
                return Err(InfralinkError::Schema(format!(
                    "duplicate edge id: {}",
                    edge.id()
                )));
            }
        }

        info!(edges = edges.len(), "edge set built");
        Ok(Self {
            edges,
            by_id,
            schema_version: schema_version.into(),
        })
    }

    pub fn get(&self, id: &str) -> InfralinkResult<&Edge> {
        self.by_id
            .get(id)
            .map(|&idx| &self.edges[idx])
            .ok_or_else(|| InfralinkError::edge_not_found(id))
    }

    fn select(&self, pred: impl Fn(&Edge) -> bool) -> Vec<&Edge> {
        self.edges.iter().filter(|e| pred(e)).collect()
    }

    pub fn by_type(&self, edge_type: EdgeType) -> Vec<&Edge> {
        self.select(|e| e.edge_type() == edge_type)
    }

    pub fn by_criticality(&self, criticality: Criticality) -> Vec<&Edge> {
        self.select(|e| e.criticality() == criticality)
    }

    pub fn critical_edges(&self) -> Vec<&Edge> {
        self.by_criticality(Criticality::Critical)
    }

    pub fn database_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Database)
    }

    pub fn queue_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Queue)
    }

    pub fn cluster_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Cluster)
    }

    pub fn telemetry_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Telemetry)
    }

    pub fn monitoring_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Monitoring)
    }

    pub fn api_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Api)
    }

    pub fn storage_edges(&self) -> Vec<&Edge> {
        self.by_type(EdgeType::Storage)
    }

    /// Edges whose target is the given host
    pub fn targeting_host(&self, host: Uuid) -> Vec<&Edge> {
        self.select(|e| e.target_host() == host)
    }

    /// Edges listing the given host as a source (wildcard edges match every host)
    pub fn from_host(&self, host: Uuid) -> Vec<&Edge> {
        self.select(|e| e.matches_source(host))
    }

    pub fn targeting_service(&self, service: &str) -> Vec<&Edge> {
        self.select(|e| e.target_service() == service)
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}
