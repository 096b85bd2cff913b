// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Edge Resolution
//!
//! Determinism, address preference order, URL escaping round-trips and
//! secret hygiene of template contexts.

use infralink::domain::AddressKind;
use infralink::{EdgeResolver, EdgeSet, EdgeSetDeclaration, Registry, RegistryDeclaration, UrlOptions};
use proptest::prelude::*;
use reqwest::Url;
use serde_json::{json, Map, Value};
use std::net::Ipv4Addr;

const TARGET: &str = "d1b9e5d5-36b0-459d-a556-96622811fbd5";
const SOURCE: &str = "fa2b9872-d94c-4b20-a73a-57a205560769";

// ============================================================================
// Topology Builders
// ============================================================================

fn topology(
    overlay: Option<Ipv4Addr>,
    public: Option<Ipv4Addr>,
    private: Option<Ipv4Addr>,
    port: u16,
    metadata: Map<String, Value>,
) -> (Registry, EdgeSet) {
    let mut target = json!({
        "canonical_name": "target",
        "services": { "db": { "port": port } }
    });
    for (key, addr) in [("overlay_ip", overlay), ("public_ip", public), ("private_ip", private)] {
        if let Some(addr) = addr {
            target[key] = json!(addr.to_string());
        }
    }

    let registry = Registry::from_declaration(
        serde_json::from_value::<RegistryDeclaration>(json!({
            "hosts": {
                TARGET: target,
                SOURCE: { "canonical_name": "source", "private_ip": "10.0.0.1" }
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let edges = EdgeSet::from_declaration(
        serde_json::from_value::<EdgeSetDeclaration>(json!({
            "edges": [{
                "id": "edge",
                "type": "database",
                "from": { "hosts": [SOURCE] },
                "to": { "host": TARGET, "service": "db" },
                "protocol": "postgresql",
                "auth": { "type": "password", "secret_ref": "db-secret" },
                "metadata": Value::Object(metadata)
            }]
        }))
        .unwrap(),
    )
    .unwrap();

    (registry, edges)
}

// ============================================================================
// Strategies
// ============================================================================

fn ipv4() -> impl Strategy<Value = Ipv4Addr> {
    any::<[u8; 4]>().prop_map(Ipv4Addr::from)
}

fn port() -> impl Strategy<Value = u16> {
    1..=u16::MAX
}

/// Printable ASCII including the characters URLs reserve
fn credential() -> impl Strategy<Value = String> {
    "[ -~]{1,24}"
}

fn secretish_key() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["password", "db_password", "api_token", "secret", "Credential"])
        .prop_map(String::from)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Resolution is deterministic
    ///
    /// Resolving the same edge twice against the same registry yields the
    /// same endpoint, and that endpoint is exactly `address:port`.
    #[test]
    fn prop_resolution_is_deterministic(addr in ipv4(), port in port()) {
        let (registry, edges) = topology(Some(addr), None, None, port, Map::new());
        let resolver = EdgeResolver::new(&registry, &edges);

        let first = resolver.get_target_endpoint("edge").unwrap();
        let second = resolver.get_target_endpoint("edge").unwrap();

        prop_assert_eq!(&first, &second, "Same registry must give same endpoint");
        prop_assert_eq!(first, format!("{}:{}", addr, port));
    }

    /// Property: Overlay beats public beats private
    ///
    /// The resolved address kind is always the first configured kind in the
    /// default preference order.
    #[test]
    fn prop_default_preference_order(
        overlay in prop::option::of(ipv4()),
        public in prop::option::of(ipv4()),
        private in prop::option::of(ipv4()),
        port in port(),
    ) {
        prop_assume!(overlay.is_some() || public.is_some() || private.is_some());

        let (registry, edges) = topology(overlay, public, private, port, Map::new());
        let resolved = EdgeResolver::new(&registry, &edges).resolve("edge").unwrap();

        let expected = [
            (AddressKind::Overlay, overlay),
            (AddressKind::Public, public),
            (AddressKind::Private, private),
        ]
        .into_iter()
        .find_map(|(kind, addr)| addr.map(|a| (kind, a)))
        .unwrap();

        prop_assert_eq!(resolved.address_kind, expected.0);
        prop_assert_eq!(resolved.address.as_str(), expected.1.to_string());
    }

    /// Property: Credentials survive a URL round-trip
    ///
    /// Any printable user, password and database name, once embedded, parse
    /// back out of the URL unchanged.
    #[test]
    fn prop_url_round_trip(
        addr in ipv4(),
        port in port(),
        user in credential(),
        password in credential(),
        database in credential(),
    ) {
        // Dot segments are path syntax, not names
        prop_assume!(database != "." && database != "..");

        let (registry, edges) = topology(Some(addr), None, None, port, Map::new());
        let resolver = EdgeResolver::new(&registry, &edges);
        let host = addr.to_string();

        let raw = resolver
            .get_connection_url(
                "edge",
                &UrlOptions::new().user(user.clone()).password(password.clone()).database(database.clone()),
            )
            .unwrap();
        let url = Url::parse(&raw).unwrap();

        prop_assert_eq!(url.scheme(), "postgresql");
        prop_assert_eq!(url.host_str(), Some(host.as_str()));
        prop_assert_eq!(url.port(), Some(port));
        prop_assert_eq!(urlencoding::decode(url.username()).unwrap(), user);
        prop_assert_eq!(urlencoding::decode(url.password().unwrap_or_default()).unwrap(), password);
        prop_assert_eq!(urlencoding::decode(&url.path()[1..]).unwrap(), database);
    }

    /// Property: Template contexts never leak secrets
    ///
    /// Neither the password nor metadata keys that look like credentials reach
    /// the default context.
    #[test]
    fn prop_template_context_has_no_secrets(
        addr in ipv4(),
        port in port(),
        key in secretish_key(),
        value in credential(),
    ) {
        let mut metadata = Map::new();
        metadata.insert(key.clone(), json!(value));
        metadata.insert("owner".to_string(), json!("data-team"));

        let (registry, edges) = topology(Some(addr), None, None, port, metadata);
        let ctx = EdgeResolver::new(&registry, &edges).get_template_context("edge").unwrap();

        prop_assert!(!ctx.contains_key(&key));
        prop_assert!(!ctx.contains_key("password"));
        prop_assert_eq!(ctx.get_str("owner"), Some("data-team".to_string()));
    }
}
