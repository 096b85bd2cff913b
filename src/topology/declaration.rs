// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration Shapes
//!
//! The exact shape the core requires from an external loader. Declarations are
//! plain serde types; converting them into [`Host`]/[`Edge`] validates every
//! field constraint and reports violations as [`InfralinkError::Schema`].
//!
//! ```json
//! {
//!   "hosts": {
//!     "d1b9e5d5-36b0-459d-a556-96622811fbd5": {
//!       "canonical_name": "prod-database",
//!       "tailscale_ip": "100.78.109.111",
//!       "services": { "postgresql": { "port": 5432 } }
//!     }
//!   }
//! }
//! ```

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

use crate::domain::edge::parse_duration;
use crate::domain::{
    AuthDescriptor, Edge, EdgeMetadata, EdgeSource, EdgeTarget, EdgeType, HealthCheckSpec,
    Host, HostAddresses, HostStatus, NetworkAddress, Observability, Port, Service, SourceHosts,
    SourceSelector,
};
use crate::errors::{InfralinkError, InfralinkResult};

/// Host collection keyed by UUID, in declaration order
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryDeclaration {
    #[serde(default, deserialize_with = "ordered_hosts")]
    pub hosts: Vec<(String, HostDeclaration)>,

    /// Edges embedded directly in the registry document
    #[serde(default)]
    pub edges: Vec<EdgeDeclaration>,

    /// Registry-wide defaults handed to configuration generators unchanged
    #[serde(default, alias = "ansible_defaults")]
    pub defaults: BTreeMap<String, serde_json::Value>,
}

impl RegistryDeclaration {
    pub fn from_json_str(json: &str) -> InfralinkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> InfralinkResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Keeps the JSON object order of the `hosts` map, which a `HashMap` would lose
fn ordered_hosts<'de, D>(deserializer: D) -> Result<Vec<(String, HostDeclaration)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedHosts;

    impl<'de> Visitor<'de> for OrderedHosts {
        type Value = Vec<(String, HostDeclaration)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of host UUID to host declaration")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut hosts = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, HostDeclaration>()? {
                hosts.push(entry);
            }
            Ok(hosts)
        }
    }

    deserializer.deserialize_map(OrderedHosts)
}

/// Services either as a name list or as a name to service map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ServicesDeclaration {
    Detailed(BTreeMap<String, Service>),
    Names(Vec<String>),
}

impl Default for ServicesDeclaration {
    fn default() -> Self {
        Self::Detailed(BTreeMap::new())
    }
}

/// Roles either as a name list or as a role to configuration map
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RolesDeclaration {
    Names(Vec<String>),
    Configured(BTreeMap<String, serde_json::Value>),
}

impl Default for RolesDeclaration {
    fn default() -> Self {
        Self::Names(Vec::new())
    }
}

/// Host declaration (the UUID is the map key, not a field)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostDeclaration {
    pub canonical_name: String,
    #[serde(default)]
    pub status: HostStatus,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub cloud: Option<String>,
    #[serde(default, alias = "tailscale_ip")]
    pub overlay_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub public_ipv6: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub services: ServicesDeclaration,
    #[serde(default)]
    pub roles: RolesDeclaration,
    #[serde(default)]
    pub dns_hostnames: Vec<String>,
    #[serde(default)]
    pub observability: Option<Observability>,
}

impl HostDeclaration {
    /// Validate and convert into an immutable [`Host`]
    pub fn into_host(self, id: Uuid) -> InfralinkResult<Host> {
        let canonical_name = self.canonical_name.trim().to_string();
        if canonical_name.is_empty() {
            return Err(InfralinkError::Schema(format!(
                "host {} has an empty canonical_name",
                id
            )));
        }

        let parse = |field: &str, value: Option<String>| -> InfralinkResult<Option<NetworkAddress>> {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| {
                    NetworkAddress::new(&v).map_err(|e| {
                        InfralinkError::Schema(format!("host {} {}: {}", canonical_name, field, e))
                    })
                })
                .transpose()
        };

        let addresses = HostAddresses {
            overlay: parse("overlay_ip", self.overlay_ip)?,
            public: parse("public_ip", self.public_ip)?,
            private: parse("private_ip", self.private_ip)?,
        };
        let public_ipv6 = parse("public_ipv6", self.public_ipv6)?;

        let services = match self.services {
            ServicesDeclaration::Detailed(map) => map,
            ServicesDeclaration::Names(names) => names
                .into_iter()
                .map(|name| (name, Service::new(None)))
                .collect(),
        };

        let roles: BTreeSet<String> = match self.roles {
            RolesDeclaration::Names(names) => names.into_iter().collect(),
            RolesDeclaration::Configured(map) => map.into_keys().collect(),
        };

        Ok(Host {
            id,
            canonical_name,
            status: self.status,
            group: self.group,
            cloud: self.cloud,
            addresses,
            public_ipv6,
            services,
            roles,
            dns_hostnames: self.dns_hostnames,
            observability: self.observability,
        })
    }
}

/// Edge collection in declaration order
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSetDeclaration {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub edges: Vec<EdgeDeclaration>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl Default for EdgeSetDeclaration {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            edges: Vec::new(),
        }
    }
}

impl EdgeSetDeclaration {
    pub fn from_json_str(json: &str) -> InfralinkResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> InfralinkResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Edges embedded in a registry document
    pub fn from_registry(registry: &RegistryDeclaration) -> Self {
        Self {
            schema_version: default_schema_version(),
            edges: registry.edges.clone(),
        }
    }
}

/// Source host list: `"*"` or explicit UUIDs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceHostsDeclaration {
    Wildcard(String),
    Listed(Vec<String>),
}

impl Default for SourceHostsDeclaration {
    fn default() -> Self {
        Self::Listed(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceDeclaration {
    #[serde(default)]
    pub hosts: SourceHostsDeclaration,
    #[serde(default)]
    pub selector: Option<SourceSelector>,
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetDeclaration {
    pub host: String,
    pub service: String,
    #[serde(default)]
    pub port: Option<u32>,
}

/// Edge declaration
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDeclaration {
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    #[serde(rename = "from")]
    pub source: SourceDeclaration,
    #[serde(rename = "to")]
    pub target: TargetDeclaration,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub auth: AuthDescriptor,
    #[serde(default, alias = "healthcheck")]
    pub health_check: Option<HealthCheckSpec>,
    #[serde(default)]
    pub metadata: EdgeMetadata,
}

impl EdgeDeclaration {
    /// Validate and convert into an immutable [`Edge`]
    ///
    /// Host references are only checked for UUID shape here; whether they exist
    /// in a registry is a resolution-time question.
    pub fn into_edge(self) -> InfralinkResult<Edge> {
        let id = self.id.trim().to_string();
        if id.is_empty() {
            return Err(InfralinkError::Schema("edge with empty id".to_string()));
        }

        let schema = |msg: String| InfralinkError::Schema(format!("edge {}: {}", id, msg));
        let uuid = |raw: &str| {
            Uuid::parse_str(raw.trim()).map_err(|_| schema(format!("invalid host UUID: {}", raw)))
        };

        let hosts = match self.source.hosts {
            SourceHostsDeclaration::Wildcard(w) if w.trim() == "*" => SourceHosts::All,
            SourceHostsDeclaration::Wildcard(other) => SourceHosts::Listed(vec![uuid(&other)?]),
            SourceHostsDeclaration::Listed(list) => SourceHosts::Listed(
                list.iter().map(|h| uuid(h)).collect::<InfralinkResult<Vec<_>>>()?,
            ),
        };

        let selector = self.source.selector.filter(|s| !s.is_empty());
        if matches!(&hosts, SourceHosts::Listed(h) if h.is_empty()) && selector.is_none() {
            return Err(schema("declares no source hosts or selector".to_string()));
        }

        if self.target.service.trim().is_empty() {
            return Err(schema("target service is empty".to_string()));
        }

        let port = self
            .target
            .port
            .map(Port::new)
            .transpose()
            .map_err(|e| schema(e.to_string()))?;

        if let Some(check) = &self.health_check {
            if let Some(code) = check.expected_status.iter().find(|c| !(100..=599).contains(*c)) {
                return Err(schema(format!("invalid expected HTTP status: {}", code)));
            }
            if let Some(timeout) = &check.timeout {
                parse_duration(timeout).map_err(|e| schema(format!("health check timeout: {}", e)))?;
            }
        }

        let protocol = self.protocol.filter(|p| !p.trim().is_empty());

        Ok(Edge {
            to: EdgeTarget {
                host: uuid(&self.target.host)?,
                service: self.target.service,
                port,
            },
            id,
            edge_type: self.edge_type,
            from: EdgeSource {
                hosts,
                selector,
                service: self.source.service,
            },
            protocol,
            auth: self.auth,
            health_check: self.health_check,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hosts_keep_declaration_order() {
        let decl = RegistryDeclaration::from_json_str(
            r#"{
                "hosts": {
                    "fa2b9872-d94c-4b20-a73a-57a205560769": { "canonical_name": "zeta" },
                    "d1b9e5d5-36b0-459d-a556-96622811fbd5": { "canonical_name": "alpha" }
                }
            }"#,
        )
        .unwrap();
        let names: Vec<_> = decl.hosts.iter().map(|(_, h)| h.canonical_name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_service_name_list_is_accepted() {
        let decl: HostDeclaration = serde_json::from_value(json!({
            "canonical_name": "prod-app",
            "tailscale_ip": "100.69.66.115",
            "services": ["nginx", "app"],
            "roles": { "app-worker": { "concurrency": 10 } }
        }))
        .unwrap();
        let host = decl.into_host(Uuid::nil()).unwrap();
        assert!(host.has_service("nginx"));
        assert!(host.service("app").unwrap().port.is_none());
        assert!(host.has_role("app-worker"));
    }

    #[test]
    fn test_host_observability_and_ipv6() {
        let decl: HostDeclaration = serde_json::from_value(json!({
            "canonical_name": "prod-app",
            "public_ip": "91.99.122.86",
            "public_ipv6": "2a01:4f8:c012:1234::1",
            "observability": { "ready": true, "port_overrides": { "node_exporter": 9101 } }
        }))
        .unwrap();
        let host = decl.into_host(Uuid::nil()).unwrap();
        assert!(host.is_observability_ready());
        assert_eq!(
            host.observability().unwrap().port_overrides["node_exporter"],
            9101
        );
        assert_eq!(host.public_ipv6().map(|a| a.as_str()), Some("2a01:4f8:c012:1234::1"));
        assert_eq!(host.addresses().public.as_ref().map(|a| a.as_str()), Some("91.99.122.86"));
    }

    #[test]
    fn test_registry_defaults_are_kept() {
        let decl = RegistryDeclaration::from_json_str(
            r#"{ "hosts": {}, "ansible_defaults": { "ansible_user": "deploy" } }"#,
        )
        .unwrap();
        assert_eq!(decl.defaults["ansible_user"], json!("deploy"));
    }

    #[test]
    fn test_invalid_address_is_schema_error() {
        let decl: HostDeclaration = serde_json::from_value(json!({
            "canonical_name": "broken",
            "public_ip": "not an address"
        }))
        .unwrap();
        assert!(matches!(decl.into_host(Uuid::nil()), Err(InfralinkError::Schema(_))));
    }

    fn edge_json(to_host: &str, port: Option<u32>) -> serde_json::Value {
        json!({
            "id": "app-to-postgres",
            "type": "database",
            "from": { "hosts": ["fa2b9872-d94c-4b20-a73a-57a205560769"], "service": "app" },
            "to": { "host": to_host, "service": "postgresql", "port": port },
            "protocol": "postgresql+psycopg2"
        })
    }

    #[test]
    fn test_edge_conversion() {
        let decl: EdgeDeclaration =
            serde_json::from_value(edge_json("d1b9e5d5-36b0-459d-a556-96622811fbd5", None)).unwrap();
        let edge = decl.into_edge().unwrap();
        assert_eq!(edge.id(), "app-to-postgres");
        assert!(edge.target().port.is_none());
        assert_eq!(edge.source().listed_hosts().len(), 1);
    }

    #[test]
    fn test_edge_rejects_malformed_uuid_and_port() {
        let decl: EdgeDeclaration = serde_json::from_value(edge_json("not-a-uuid", None)).unwrap();
        assert!(matches!(decl.into_edge(), Err(InfralinkError::Schema(_))));

        let decl: EdgeDeclaration = serde_json::from_value(edge_json(
            "d1b9e5d5-36b0-459d-a556-96622811fbd5",
            Some(0),
        ))
        .unwrap();
        assert!(matches!(decl.into_edge(), Err(InfralinkError::Schema(_))));
    }

    #[test]
    fn test_wildcard_source() {
        let decl: EdgeDeclaration = serde_json::from_value(json!({
            "id": "all-to-prometheus",
            "type": "telemetry",
            "from": { "hosts": "*" },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "prometheus", "port": 9090 }
        }))
        .unwrap();
        let edge = decl.into_edge().unwrap();
        assert!(edge.source().is_wildcard());
        assert!(edge.matches_source(Uuid::nil()));
    }

    #[test]
    fn test_query_check_edge_is_accepted() {
        let decl: EdgeDeclaration = serde_json::from_value(json!({
            "id": "app-to-postgres",
            "type": "database",
            "from": { "hosts": ["fa2b9872-d94c-4b20-a73a-57a205560769"] },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "postgresql" },
            "healthcheck": { "type": "query", "interval": "60s", "timeout": "5s", "query": "SELECT 1" }
        }))
        .unwrap();
        let edge = decl.into_edge().unwrap();
        let check = edge.health_check().unwrap();
        assert_eq!(check.method, Some(crate::domain::CheckMethod::Query));
        assert_eq!(check.deadline(), Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_malformed_check_timeout_is_rejected() {
        let decl: EdgeDeclaration = serde_json::from_value(json!({
            "id": "app-to-postgres",
            "type": "database",
            "from": { "hosts": "*" },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "postgresql" },
            "healthcheck": { "timeout": "soon" }
        }))
        .unwrap();
        assert!(matches!(decl.into_edge(), Err(InfralinkError::Schema(_))));
    }

    #[test]
    fn test_observability_selector_counts_as_source() {
        let decl: EdgeDeclaration = serde_json::from_value(json!({
            "id": "all-to-otel",
            "type": "telemetry",
            "from": { "selector": { "observability.ready": true } },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "otel", "port": 4318 }
        }))
        .unwrap();
        let edge = decl.into_edge().unwrap();
        assert_eq!(
            edge.source().selector.as_ref().and_then(|s| s.observability_ready),
            Some(true)
        );
    }

    #[test]
    fn test_edge_without_sources_is_rejected() {
        let decl: EdgeDeclaration = serde_json::from_value(json!({
            "id": "orphan",
            "type": "api",
            "from": { "hosts": [] },
            "to": { "host": "d1b9e5d5-36b0-459d-a556-96622811fbd5", "service": "api", "port": 443 }
        }))
        .unwrap();
        assert!(decl.into_edge().is_err());
    }
}
