//! `apel-loader` – ingestion of annotated perceived environments.
//!
//! Reads the JSON manifest produced by the perception pipeline and creates one
//! simulation object per detection inside a [`HostWorld`][apel_world::HostWorld].
//!
//! # Modules
//!
//! - [`loader`] – [`EnvironmentLoader`][loader::EnvironmentLoader]: manifest
//!   reading, mesh asset copy, generic/mesh/auto loading and atomic batches.
//! - [`shape`] – pose derivation from row-major rotation matrices and
//!   vertex-cloud extents.
//! - [`error`] – [`LoadError`][error::LoadError].

pub mod error;
pub mod loader;
pub mod shape;

pub use error::LoadError;
pub use loader::{EnvironmentLoader, LoadMode};
pub use shape::{half_extents, parse_pose};
