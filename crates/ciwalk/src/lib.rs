//! Ciwalk - dependency traversal over configuration-item relationship tables.
//!
//! This crate walks the relationship graph of a configuration management
//! database that only exposes a filterable record-query interface. It is
//! used for impact analysis ("what depends on X") and dependency mapping.
//!
//! # Components
//!
//! - [`reference`]: normalizes the encodings a reference field can arrive in
//! - [`class_cache`]: memoized CI class lookups for one traversal
//! - [`root`]: resolves a user-supplied name or id into the root node
//! - [`traversal`]: the depth-bounded walk itself
//! - [`query`]: the record-query collaborator and its implementations

#![forbid(unsafe_code)]

pub mod class_cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod query;
pub mod reference;
pub mod root;
pub mod traversal;

// Public CLI modules (needed by binary)
pub mod cli;
pub mod output;

pub use error::{Error, Result};
pub use traversal::traverse;
