//! Canonical models and schema constants for alma-mcp.
//!
//! This crate defines the observation record every tool emits, the raw tabular
//! shape backends return, and the archive column names shared by the query
//! builder and the normalizer.

pub mod models;
pub mod schema;

pub use models::*;
