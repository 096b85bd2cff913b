// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Loaded from a JSON file or from `INFRALINK_*` environment variables. Every
//! field has a default, so an empty object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::AddressPreference;
use crate::errors::{InfralinkError, InfralinkResult};

/// Health-check batch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Per-probe timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum probes in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Only check edges with criticality `critical`
    #[serde(default)]
    pub critical_only: bool,

    /// Address kind tried first during resolution
    #[serde(default)]
    pub address_preference: AddressPreference,
}

fn default_timeout() -> u64 {
    5
}

fn default_concurrency() -> usize {
    16
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            concurrency: default_concurrency(),
            critical_only: false,
            address_preference: AddressPreference::default(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfralinkConfig {
    /// Host registry JSON (`{"hosts": {...}}`)
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Edge set JSON; when unset, edges are read from the registry file
    #[serde(default)]
    pub edges_path: Option<PathBuf>,

    #[serde(default)]
    pub check: CheckConfig,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("registry.json")
}

impl Default for InfralinkConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            edges_path: None,
            check: CheckConfig::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> InfralinkResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| InfralinkError::Config(format!("{} has invalid value: {:?}", name, raw)))
}

fn parse_flag(name: &str, raw: &str) -> InfralinkResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(InfralinkError::Config(format!(
            "{} has invalid value: {:?}",
            name, raw
        ))),
    }
}

impl InfralinkConfig {
    /// Load from the process environment
    pub fn from_env() -> InfralinkResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source; unset variables keep defaults
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> InfralinkResult<Self> {
        let mut config = Self::default();

        if let Some(path) = var("INFRALINK_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }
        if let Some(path) = var("INFRALINK_EDGES") {
            config.edges_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = var("INFRALINK_TIMEOUT_SECS") {
            config.check.timeout_secs = parse_var("INFRALINK_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = var("INFRALINK_CONCURRENCY") {
            config.check.concurrency = parse_var("INFRALINK_CONCURRENCY", &raw)?;
        }
        if let Some(raw) = var("INFRALINK_CRITICAL_ONLY") {
            config.check.critical_only = parse_flag("INFRALINK_CRITICAL_ONLY", &raw)?;
        }
        if let Some(raw) = var("INFRALINK_ADDRESS_PREFERENCE") {
            config.check.address_preference = raw.parse().map_err(InfralinkError::Config)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> InfralinkResult<Self> {
        let config: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> InfralinkResult<()> {
        if self.check.timeout_secs == 0 {
            return Err(InfralinkError::Config("timeout_secs must be positive".to_string()));
        }
        if self.check.concurrency == 0 {
            return Err(InfralinkError::Config("concurrency must be positive".to_string()));
        }
        Ok(())
    }
}
