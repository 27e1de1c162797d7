//! MCP tool modules.
//!
//! Tools are grouped by how they reach the archive: positional searches that
//! may resolve names, catalog searches over observation metadata, and
//! contextual help.

pub mod catalog;
pub mod search;
mod context;
