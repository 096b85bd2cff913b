// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify resolution properties over
//! generated hosts, addresses and credentials.

mod property;
