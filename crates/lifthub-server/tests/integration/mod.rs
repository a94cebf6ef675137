//! Integration tests for lifthub-server.
//!
//! These tests verify the interaction between components:
//! - Upstream connection lifecycle against a mock scoring engine
//! - Snapshot/update flow into the hub's query API
//! - Full refresh forcing a reconnect-driven resync

pub mod common;
