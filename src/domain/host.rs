// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Entity
//!
//! A host is an infrastructure node identified by an immutable UUID. Hosts are
//! created once when the registry is built and are never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use super::network::{AddressKind, AddressPreference, HostAddresses, NetworkAddress, Port};

/// Host lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    #[default]
    Active,
    Provisioning,
    Maintenance,
    Terminated,
}

impl HostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Provisioning => "provisioning",
            Self::Maintenance => "maintenance",
            Self::Terminated => "terminated",
        }
    }

    /// Terminated hosts can never be connection targets
    pub fn is_resolvable(&self) -> bool {
        !matches!(self, Self::Terminated)
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exposure level of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    #[default]
    Internal,
    Public,
}

/// Named capability on a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Declared listening port, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    #[serde(default)]
    pub exposure: Exposure,

    /// HTTP path used by HTTP health checks against this service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck_path: Option<String>,
}

fn default_protocol() -> String {
    "tcp".to_string()
}

impl Service {
    pub fn new(port: Option<Port>) -> Self {
        Self {
            port,
            protocol: default_protocol(),
            exposure: Exposure::Internal,
            healthcheck_path: None,
        }
    }
}

/// Observability rollout state of a host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observability {
    /// Host is ready to ship telemetry
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_services: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmanaged_services: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub port_overrides: BTreeMap<String, u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Infrastructure host
///
/// # Invariants
/// - `id` is unique within a registry and never reused
/// - `canonical_name` is unique within a registry
/// - at most one address per [`AddressKind`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    pub(crate) id: Uuid,
    pub(crate) canonical_name: String,
    pub(crate) status: HostStatus,
    pub(crate) group: Option<String>,
    pub(crate) cloud: Option<String>,
    pub(crate) addresses: HostAddresses,
    /// Informational; never selected for resolution
    pub(crate) public_ipv6: Option<NetworkAddress>,
    pub(crate) services: BTreeMap<String, Service>,
    pub(crate) roles: BTreeSet<String>,
    pub(crate) dns_hostnames: Vec<String>,
    pub(crate) observability: Option<Observability>,
}

impl Host {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First eight characters of the UUID, used as a short display id
    pub fn uuid_prefix(&self) -> String {
        self.id.to_string()[..8].to_string()
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn status(&self) -> HostStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == HostStatus::Active
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn cloud(&self) -> Option<&str> {
        self.cloud.as_deref()
    }

    pub fn addresses(&self) -> &HostAddresses {
        &self.addresses
    }

    pub fn address(&self, kind: AddressKind) -> Option<&NetworkAddress> {
        self.addresses.get(kind)
    }

    /// Address chosen by the given preference, skipping unset kinds
    pub fn preferred_address(&self, preference: AddressPreference) -> Option<&NetworkAddress> {
        self.addresses.select(preference).map(|(_, addr)| addr)
    }

    pub fn public_ipv6(&self) -> Option<&NetworkAddress> {
        self.public_ipv6.as_ref()
    }

    pub fn services(&self) -> &BTreeMap<String, Service> {
        &self.services
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn dns_hostnames(&self) -> &[String] {
        &self.dns_hostnames
    }

    pub fn observability(&self) -> Option<&Observability> {
        self.observability.as_ref()
    }

    /// `observability.ready`, false when the host declares no observability
    pub fn is_observability_ready(&self) -> bool {
        self.observability.as_ref().is_some_and(|o| o.ready)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}..., {})",
            self.canonical_name,
            self.uuid_prefix(),
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(status: HostStatus) -> Host {
        Host {
            id: Uuid::parse_str("d1b9e5d5-36b0-459d-a556-96622811fbd5").unwrap(),
            canonical_name: "prod-database".to_string(),
            status,
            group: Some("data".to_string()),
            cloud: None,
            addresses: HostAddresses {
                overlay: None,
                public: Some(NetworkAddress::new("91.99.122.86").unwrap()),
                private: None,
            },
            public_ipv6: None,
            services: BTreeMap::from([("postgresql".to_string(), Service::new(Port::new(5432).ok()))]),
            roles: BTreeSet::from(["primary".to_string()]),
            dns_hostnames: Vec::new(),
            observability: None,
        }
    }

    #[test]
    fn test_host_accessors() {
        let h = host(HostStatus::Active);
        assert_eq!(h.uuid_prefix(), "d1b9e5d5");
        assert!(h.is_active());
        assert!(h.has_service("postgresql"));
        assert!(h.has_role("primary"));
        assert_eq!(
            h.preferred_address(AddressPreference::Overlay).map(|a| a.as_str()),
            Some("91.99.122.86")
        );
        assert!(!h.is_observability_ready());
    }

    #[test]
    fn test_observability_defaults() {
        let obs: Observability = serde_json::from_str(r#"{"managed_services": ["node"]}"#).unwrap();
        assert!(!obs.ready);
        assert_eq!(obs.managed_services, vec!["node"]);

        let mut h = host(HostStatus::Active);
        h.observability = Some(Observability {
            ready: true,
            ..Observability::default()
        });
        assert!(h.is_observability_ready());
    }

    #[test]
    fn test_terminated_is_not_resolvable() {
        assert!(!HostStatus::Terminated.is_resolvable());
        assert!(HostStatus::Maintenance.is_resolvable());
        assert_eq!(format!("{}", host(HostStatus::Terminated)), "prod-database (d1b9e5d5..., terminated)");
    }

    #[test]
    fn test_service_defaults() {
        let svc: Service = serde_json::from_str(r#"{"port": 6379}"#).unwrap();
        assert_eq!(svc.protocol, "tcp");
        assert_eq!(svc.exposure, Exposure::Internal);
        assert_eq!(svc.port.map(|p| p.value()), Some(6379));
    }
}
