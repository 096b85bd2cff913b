// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Properties of edge resolution that must hold for every valid topology.

mod resolution;
