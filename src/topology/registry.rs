// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Registry
//!
//! In-memory index over hosts, built once from declarations and read-only
//! afterwards. Lookups accept a full UUID, a canonical name, or an unambiguous
//! UUID prefix.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Host, HostStatus};
use crate::errors::{InfralinkError, InfralinkResult};

use super::declaration::{HostDeclaration, RegistryDeclaration};

/// Criteria for [`Registry::filter`]; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFilter {
    pub status: Option<HostStatus>,
    pub group: Option<String>,
    pub cloud: Option<String>,
    pub service: Option<String>,
    pub role: Option<String>,
    pub observability_ready: Option<bool>,
}

impl HostFilter {
    pub fn status(mut self, status: HostStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn cloud(mut self, cloud: impl Into<String>) -> Self {
        self.cloud = Some(cloud.into());
        self
    }

    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn observability_ready(mut self, ready: bool) -> Self {
        self.observability_ready = Some(ready);
        self
    }

    pub fn matches(&self, host: &Host) -> bool {
        self.status.map_or(true, |s| host.status() == s)
            && self.group.as_deref().map_or(true, |g| host.group() == Some(g))
            && self.cloud.as_deref().map_or(true, |c| host.cloud() == Some(c))
            && self.service.as_deref().map_or(true, |s| host.has_service(s))
            && self.role.as_deref().map_or(true, |r| host.has_role(r))
            && self
                .observability_ready
                .map_or(true, |ready| host.is_observability_ready() == ready)
    }
}

/// Infrastructure host registry
#[derive(Debug, Clone, Default)]
pub struct Registry {
    hosts: Vec<Host>,
    by_id: HashMap<Uuid, usize>,
    by_name: HashMap<String, usize>,
    defaults: BTreeMap<String, Value>,
}

impl Registry {
    /// Build the registry from declarations
    ///
    /// # Errors
    /// [`InfralinkError::Schema`] on a malformed UUID key, a duplicate UUID, a
    /// duplicate canonical name, or an invalid host declaration.
    pub fn from_declaration(declaration: RegistryDeclaration) -> InfralinkResult<Self> {
        let mut hosts = Vec::with_capacity(declaration.hosts.len());
        for (key, host) in declaration.hosts {
            let id = Uuid::parse_str(key.trim())
                .map_err(|_| InfralinkError::Schema(format!("invalid host UUID: {}", key)))?;
            hosts.push(host.into_host(id)?);
        }
        let mut registry = Self::from_hosts(hosts)?;
        registry.defaults = declaration.defaults;
        Ok(registry)
    }

    /// Build from `(uuid, declaration)` pairs
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (Uuid, HostDeclaration)>,
    ) -> InfralinkResult<Self> {
        let hosts = pairs
            .into_iter()
            .map(|(id, decl)| decl.into_host(id))
            .collect::<InfralinkResult<Vec<_>>>()?;
        Self::from_hosts(hosts)
    }

    fn from_hosts(hosts: Vec<Host>) -> InfralinkResult<Self> {
        let mut by_id = HashMap::with_capacity(hosts.len());
        let mut by_name = HashMap::with_capacity(hosts.len());

        for (idx, host) in hosts.iter().enumerate() {
            if by_id.insert(host.id(), idx).is_some() {
                return Err(InfralinkError::Schema(format!(
                    "duplicate host UUID: {}",
                    host.id()
                )));
            }
            if by_name.insert(host.canonical_name().to_string(), idx).is_some() {
                return Err(InfralinkError::Schema(format!(
                    "duplicate canonical name: {}",
                    host.canonical_name()
                )));
            }
        }

        info!(hosts = hosts.len(), "registry built");
        Ok(Self {
            hosts,
            by_id,
            by_name,
            defaults: BTreeMap::new(),
        })
    }

    /// Look up a host by UUID, canonical name, or unique UUID prefix
    pub fn get(&self, identifier: &str) -> InfralinkResult<&Host> {
        let identifier = identifier.trim();
        if let Ok(id) = Uuid::parse_str(identifier) {
            return self.get_by_uuid(id);
        }
        if let Some(host) = self.get_by_name(identifier) {
            return Ok(host);
        }
        self.get_by_uuid_prefix(identifier)
    }

    pub fn get_by_uuid(&self, id: Uuid) -> InfralinkResult<&Host> {
        self.by_id
            .get(&id)
            .map(|&idx| &self.hosts[idx])
            .ok_or_else(|| InfralinkError::host_not_found(id.to_string()))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Host> {
        self.by_name.get(name).map(|&idx| &self.hosts[idx])
    }

    /// Host whose UUID starts with `prefix`; ambiguous prefixes are not found
    pub fn get_by_uuid_prefix(&self, prefix: &str) -> InfralinkResult<&Host> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(InfralinkError::host_not_found(prefix));
        }

        let matches: Vec<&Host> = self
            .hosts
            .iter()
            .filter(|h| h.id().to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [host] => Ok(*host),
            [] => Err(InfralinkError::host_not_found(prefix)),
            _ => {
                debug!(prefix = %prefix, candidates = matches.len(), "ambiguous UUID prefix");
                Err(InfralinkError::host_not_found(prefix))
            }
        }
    }

    /// Hosts matching every supplied criterion, in declaration order
    pub fn filter(&self, filter: &HostFilter) -> Vec<&Host> {
        self.hosts.iter().filter(|h| filter.matches(h)).collect()
    }

    pub fn active_hosts(&self) -> Vec<&Host> {
        self.filter(&HostFilter::default().status(HostStatus::Active))
    }

    pub fn hosts_with_role(&self, role: &str) -> Vec<&Host> {
        self.filter(&HostFilter::default().role(role))
    }

    pub fn hosts_with_service(&self, service: &str) -> Vec<&Host> {
        self.filter(&HostFilter::default().service(service))
    }

    pub fn groups(&self) -> BTreeSet<&str> {
        self.hosts.iter().filter_map(|h| h.group()).collect()
    }

    pub fn clouds(&self) -> BTreeSet<&str> {
        self.hosts.iter().filter_map(|h| h.cloud()).collect()
    }

    /// Registry-wide defaults (`ansible_defaults`), passed through untouched
    pub fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_ok()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Host;
    type IntoIter = std::slice::Iter<'a, Host>;

    fn into_iter(self) -> Self::IntoIter {
        self.hosts.iter()
    }
}
