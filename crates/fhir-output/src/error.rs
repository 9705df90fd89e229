//! Output error types.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to write (or read back) one bundle file.
///
/// Only the affected patient's output is lost; other bundles continue.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize bundle {bundle_id}: {source}")]
    Serialize {
        bundle_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} already holds bundle {existing} in this run")]
    PathTaken { path: PathBuf, existing: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse bundle {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, WriteError>;
