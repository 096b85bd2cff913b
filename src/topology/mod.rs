// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Indices
//!
//! [`Registry`] and [`EdgeSet`] are built once from declarations and are
//! read-only afterwards, so any number of resolvers and checkers may read them
//! concurrently without locking.

pub mod declaration;
pub mod edges;
pub mod registry;

pub use declaration::{
    EdgeDeclaration, EdgeSetDeclaration, HostDeclaration, RegistryDeclaration,
};
pub use edges::EdgeSet;
pub use registry::{HostFilter, Registry};
