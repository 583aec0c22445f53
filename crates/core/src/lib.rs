//! Core types, schemas, and validation for the orders pipeline.

pub mod analytics;
pub mod error;
pub mod orders;

pub use analytics::*;
pub use error::{Error, Result};
pub use orders::*;
