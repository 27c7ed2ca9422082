//! `apel-types` – shared vocabulary of the annotated perceived environment
//! loader.
//!
//! - [`geometry`] – [`Vec3`][geometry::Vec3], [`Quaternion`][geometry::Quaternion],
//!   [`HomogeneousMatrix`][geometry::HomogeneousMatrix] and [`Pose`][geometry::Pose].
//! - Manifest records ([`ObjectRecord`], [`PoseRecord`]) as they appear in the
//!   perception pipeline's JSON output.
//! - [`Rgba`] colors and the [`WorldError`] type reported by host worlds.

pub mod geometry;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{HomogeneousMatrix, Pose, Quaternion, Vec3};

/// Pose of a detected object as written by the perception pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PoseRecord {
    /// Translation in the world frame, metres.
    pub position: [f64; 3],
    /// 3x3 rotation matrix flattened row-major.
    pub rotation: [f64; 9],
}

/// One detected object in an environment manifest.
///
/// `vertices` feeds box-shaped loading, `obj_file` + `scale` feed mesh
/// loading.  Both may be present; the caller picks the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectRecord {
    /// Semantic class label, e.g. `"Cup"`.
    pub class: String,
    /// Instance id, unique per class within a scene.
    pub id: i64,
    pub pose: PoseRecord,
    /// Mesh file, relative to the manifest's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj_file: Option<String>,
    /// Raw vertex cloud of the detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<[f64; 3]>>,
    /// Scale factors; only the first element is used (uniform scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec<f64>>,
    /// Display color as `#RRGGBB`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ObjectRecord {
    /// `<class>_<id>`, the name under which the object is created.
    pub fn object_name(&self) -> String {
        format!("{}_{}", self.class, self.id)
    }
}

/// An RGBA color with channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` (leading `#` optional) with the given alpha.
    pub fn from_hex(hex: &str, alpha: f64) -> Result<Self, ColorError> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorError(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| ColorError(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

/// A color string that is not `#RRGGBB`.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid hex color '{0}' (expected #RRGGBB)")]
pub struct ColorError(pub String);

/// Errors a host world reports when asked to create or remove objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("an object named '{0}' already exists")]
    DuplicateName(String),

    #[error("no object named '{0}' in this world")]
    UnknownObject(String),

    #[error("mesh asset not found: {0}")]
    MissingAsset(String),

    #[error("invalid scale {scale} for object '{name}'")]
    InvalidScale { name: String, scale: f64 },
}
