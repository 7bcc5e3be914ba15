//! Error types for listing and reconciliation.
//!
//! Recoverable conditions (a directory without a readable git config, a
//! remote on another host, an entry that cannot be stat'ed) never show up
//! here; they are logged and the entry is classified or skipped. What is
//! left is either a setup problem or a failure of the remote catalog.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No repositories directory configured. Set `repos_dir` in {0}")]
    NoRootDirectory(PathBuf),

    #[error("Failed to read repositories directory {path}: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid directory name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Failure reported by a catalog source while fetching a page.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("GitHub token not configured. Set `github_token` in config.toml or GITHUB_TOKEN")]
    MissingToken,

    #[error("Catalog request failed: {0}")]
    Request(String),

    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),

    #[error("Catalog returned errors: {0}")]
    Api(String),
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The catalog failed after `pages` pages were already folded and emitted.
    #[error("Catalog failed after {pages} page(s): {source}")]
    Catalog {
        pages: usize,
        #[source]
        source: CatalogError,
    },

    #[error("Reconcile task stopped unexpectedly: {0}")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
