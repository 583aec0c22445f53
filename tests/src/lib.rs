//! Shared helpers for the integration test suite.

pub mod fixtures;
