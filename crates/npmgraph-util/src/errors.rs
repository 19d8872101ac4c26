use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all npmgraph operations.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration (e.g. npmgraph.toml).
    #[error("Config error: {message}")]
    #[diagnostic(help("Check your npmgraph.toml for syntax errors"))]
    Config { message: String },

    /// A registry lookup failed (unknown version, bad packument, etc.).
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Network request failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The dependency graph could not be resolved.
    #[error("Dependency resolution failed: {message}")]
    #[diagnostic(help("Pass at least one package name, e.g. `npmgraph graph express`"))]
    Resolution { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
