//! High-level operations wiring CLI commands to the registry client and the
//! graph resolver.

pub mod ops_cache;
pub mod ops_graph;
pub mod ops_resolve;
pub mod ops_why;
