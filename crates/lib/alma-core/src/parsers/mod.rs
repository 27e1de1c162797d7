//! Parsers for collaborator payloads.
//!
//! Archive services answer with `VOTable` documents; the name resolver answers
//! with Sesame XML. Both are decoded into the canonical model here.

pub mod sesame;
pub mod votable;

pub use sesame::{SesameParseError, SesameParser};
pub use votable::{VotableError, VotableParser};
