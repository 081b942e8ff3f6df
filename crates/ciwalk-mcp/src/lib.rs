//! MCP server for ciwalk dependency traversal.
//!
//! This crate provides an MCP (Model Context Protocol) server that exposes
//! configuration-item dependency traversal to AI assistants.
//!
//! # Architecture
//!
//! The server uses the `rmcp` crate for MCP protocol handling and wraps a
//! single `RecordQuery` store from the ciwalk crate, either the remote table
//! API or an in-memory fixture.
//!
//! # Tools
//!
//! - `traverse_dependencies` - Walk upstream/downstream relationships of a CI
//! - `connection_info` - Show which instance or fixture the server reads

pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use error::{Error, Result};
pub use server::CiwalkMcpServer;
