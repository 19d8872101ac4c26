//! Core data types for npmgraph.
//!
//! This crate defines the values the rest of the workspace passes around:
//! module identity and keys, published package manifests, the scope policy
//! deciding graph membership, and configuration.
//!
//! This crate is intentionally free of async code and network I/O.

pub mod config;
pub mod manifest;
pub mod module;
pub mod scope;
