//! Errors - hard failures that stop an operation.
//!
//! Validation findings are [`Issue`](super::Issue)s and never show up here.
//! A malformed state file is not an error either: the store recovers it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("task directory not found: {0}")]
    TaskDirMissing(PathBuf),

    #[error("failed to list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize workflow state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("profile config not found: {0}")]
    ProfileConfigMissing(PathBuf),

    #[error("profile '{0}' is not defined in the profile config")]
    ProfileNotDefined(String),

    #[error("no active_profile line in {0}")]
    ActiveProfileLineMissing(PathBuf),

    #[error("invalid reference marker: {0}")]
    InvalidMarker(#[from] regex::Error),
}

pub type LoopResult<T> = Result<T, LoopError>;
