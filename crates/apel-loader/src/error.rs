//! Errors raised while loading an environment manifest.

use std::path::PathBuf;

use apel_types::{ColorError, WorldError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest has no record {index} (it holds {len})")]
    NoSuchRecord { index: usize, len: usize },

    #[error("object '{object}' has no '{field}' field")]
    MissingField { object: String, field: &'static str },

    #[error("object '{object}' has an empty vertex list")]
    EmptyVertices { object: String },

    #[error("failed to copy mesh {from} to {to}: {source}")]
    AssetCopy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("object '{object}': {source}")]
    InvalidColor {
        object: String,
        #[source]
        source: ColorError,
    },

    #[error("host world rejected object: {0}")]
    World(#[from] WorldError),
}
