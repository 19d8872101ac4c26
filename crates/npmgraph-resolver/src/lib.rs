//! Dependency graph resolution: concurrent memoized traversal of npm
//! dependencies, latest-version tracking, and graph rendering.

pub mod annotate;
pub mod dot;
pub mod graph;
pub mod resolver;

pub use resolver::{resolve, GraphResolver, LookupFailure, Resolution};
