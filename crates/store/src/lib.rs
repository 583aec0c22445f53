//! Embedded DuckDB store for the orders pipeline.

pub mod client;
pub mod config;
pub mod insert;
pub mod schema;
pub mod snapshot;
pub mod staging;

pub use client::*;
pub use config::*;
pub use snapshot::Snapshot;
