// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for infralink
//!
//! Deterministic topologies shared by the integration tests. All UUIDs are
//! fixed constants; local health-check targets live on 127.0.0.1 with ports
//! handed in by the test that owns the listener.
#![allow(dead_code)]

use serde_json::{json, Value};
use uuid::Uuid;

use infralink::{EdgeSet, EdgeSetDeclaration, Registry, RegistryDeclaration};

pub const DATABASE_HOST: &str = "d1b9e5d5-36b0-459d-a556-96622811fbd5";
pub const APP_HOST: &str = "fa2b9872-d94c-4b20-a73a-57a205560769";
pub const MONITORING_HOST: &str = "3c6f0e2a-7b1d-4e8f-9a2b-5d4c3b2a1f00";
pub const RETIRED_HOST: &str = "7e1d2c3b-4a5f-4e6d-8c7b-9a0f1e2d3c4b";
/// Referenced by an edge but absent from every registry
pub const MISSING_HOST: &str = "00000000-dead-4bee-8f00-000000000000";

pub const LOCAL_HOST: &str = "5a5a5a5a-0000-4000-8000-000000000001";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Production-like registry; raw JSON so host order is declaration order
pub const REGISTRY_JSON: &str = r#"{
    "hosts": {
        "d1b9e5d5-36b0-459d-a556-96622811fbd5": {
            "canonical_name": "prod-database",
            "group": "data",
            "cloud": "hetzner",
            "tailscale_ip": "100.78.109.111",
            "public_ip": "91.99.122.86",
            "private_ip": "10.0.0.5",
            "services": {
                "postgresql": { "port": 5432 },
                "redis": { "port": 6379 }
            },
            "roles": ["primary"]
        },
        "fa2b9872-d94c-4b20-a73a-57a205560769": {
            "canonical_name": "prod-app",
            "group": "app",
            "cloud": "hetzner",
            "tailscale_ip": "100.69.66.115",
            "services": { "app": { "port": 8000 } },
            "roles": { "app-worker": { "concurrency": 10 } }
        },
        "3c6f0e2a-7b1d-4e8f-9a2b-5d4c3b2a1f00": {
            "canonical_name": "monitoring",
            "group": "ops",
            "cloud": "aws",
            "public_ip": "54.12.34.56",
            "services": {
                "prometheus": { "port": 9090, "healthcheck_path": "/-/healthy" }
            },
            "roles": ["app-worker"]
        },
        "7e1d2c3b-4a5f-4e6d-8c7b-9a0f1e2d3c4b": {
            "canonical_name": "old-db",
            "status": "terminated",
            "tailscale_ip": "100.64.0.9",
            "services": { "postgresql": { "port": 5432 } }
        }
    }
}"#;

pub fn edges_json() -> Value {
    json!({
        "schema_version": "1.0",
        "edges": [
            {
                "id": "app-to-postgres",
                "type": "database",
                "from": { "hosts": [APP_HOST], "service": "app" },
                "to": { "host": DATABASE_HOST, "service": "postgresql" },
                "protocol": "postgresql+psycopg2",
                "auth": { "type": "password", "secret_ref": "pg-app" },
                "metadata": { "criticality": "critical", "purpose": "primary application database" }
            },
            {
                "id": "app-to-redis",
                "type": "queue",
                "from": { "hosts": [APP_HOST] },
                "to": { "host": DATABASE_HOST, "service": "redis" },
                "protocol": "redis",
                "metadata": { "criticality": "standard" }
            },
            {
                "id": "workers-to-postgres",
                "type": "database",
                "from": { "selector": { "role": "app-worker" } },
                "to": { "host": DATABASE_HOST, "service": "postgresql" },
                "protocol": "postgresql"
            },
            {
                "id": "all-to-prometheus",
                "type": "monitoring",
                "from": { "hosts": "*" },
                "to": { "host": MONITORING_HOST, "service": "prometheus" },
                "metadata": { "criticality": "low" }
            },
            {
                "id": "app-to-ghost",
                "type": "database",
                "from": { "hosts": [APP_HOST] },
                "to": { "host": MISSING_HOST, "service": "postgresql", "port": 5432 },
                "metadata": { "criticality": "critical" }
            },
            {
                "id": "app-to-retired",
                "type": "database",
                "from": { "hosts": [APP_HOST] },
                "to": { "host": RETIRED_HOST, "service": "postgresql" }
            }
        ]
    })
}

pub fn registry() -> Registry {
    Registry::from_declaration(
        RegistryDeclaration::from_json_str(REGISTRY_JSON).expect("Invalid registry fixture"),
    )
    .expect("Registry fixture must build")
}

pub fn edge_set() -> EdgeSet {
    EdgeSet::from_declaration(
        serde_json::from_value::<EdgeSetDeclaration>(edges_json()).expect("Invalid edge fixture"),
    )
    .expect("Edge fixture must build")
}

/// Registry with a single active host on loopback
pub fn local_registry() -> Registry {
    Registry::from_declaration(
        serde_json::from_value::<RegistryDeclaration>(json!({
            "hosts": {
                LOCAL_HOST: {
                    "canonical_name": "localhost-target",
                    "private_ip": "127.0.0.1",
                    "services": { "svc": {} }
                }
            }
        }))
        .expect("Invalid local registry fixture"),
    )
    .expect("Local registry fixture must build")
}

/// Name under the reserved `.invalid` TLD; never resolves
pub const UNRESOLVABLE_NAME: &str = "db.infralink.invalid";

/// Registry whose single host is addressed only by an unresolvable DNS name
pub fn unresolvable_name_registry() -> Registry {
    Registry::from_declaration(
        serde_json::from_value::<RegistryDeclaration>(json!({
            "hosts": {
                LOCAL_HOST: {
                    "canonical_name": "nowhere",
                    "private_ip": UNRESOLVABLE_NAME,
                    "services": { "svc": {} }
                }
            }
        }))
        .expect("Invalid unresolvable registry fixture"),
    )
    .expect("Unresolvable registry fixture must build")
}

/// Edge to the loopback host on `port`
pub fn local_edge(id: &str, edge_type: &str, protocol: Option<&str>, port: u16, criticality: &str) -> Value {
    let mut edge = json!({
        "id": id,
        "type": edge_type,
        "from": { "hosts": "*" },
        "to": { "host": LOCAL_HOST, "service": "svc", "port": port },
        "metadata": { "criticality": criticality }
    });
    if let Some(protocol) = protocol {
        edge["protocol"] = json!(protocol);
    }
    edge
}

pub fn local_edges(edges: Vec<Value>) -> EdgeSet {
    EdgeSet::from_declaration(
        serde_json::from_value::<EdgeSetDeclaration>(json!({ "edges": edges }))
            .expect("Invalid local edge fixture"),
    )
    .expect("Local edge fixture must build")
}
