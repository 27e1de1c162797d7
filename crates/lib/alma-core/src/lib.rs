//! Query orchestration and result normalization for alma-mcp.
//!
//! This crate turns tool requests into backend-neutral query specs, runs them
//! against the ALMA TAP and SIA services with a single fallback, resolves
//! object names through Sesame, and normalizes whatever comes back into the
//! canonical observation record.

pub mod backend;
pub mod batch;
pub mod control;
pub mod normalize;
pub mod parsers;
pub mod query;
pub mod resolver;
pub mod services;
pub mod units;
