// Copyright (c) 2025 - Cowboy AI, Inc.
//! Template Context
//!
//! Flat key/value view of a resolved edge for downstream template substitution.
//! Secrets never appear unless the caller passes them in explicitly.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Metadata keys that look like credentials are never copied into a context
const SECRET_MARKERS: [&str; 4] = ["password", "secret", "token", "credential"];

pub(crate) fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Flat mapping of template variables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext(BTreeMap<String, Value>);

impl TemplateContext {
    pub(crate) fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Insert only when present; absent optional fields are omitted, not null
    pub(crate) fn insert_opt(&mut self, key: &str, value: Option<impl Into<Value>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String form of a value (numbers rendered, strings unquoted)
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}
