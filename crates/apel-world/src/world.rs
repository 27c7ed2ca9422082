//! Generic [`HostWorld`] trait for simulators that can spawn environment
//! objects.
//!
//! Backends implement this trait; the loader only ever talks to the trait, so
//! a Bullet-, MuJoCo- or in-process world can be swapped without touching the
//! ingestion code.

use std::path::{Path, PathBuf};

use apel_types::{Pose, Rgba, Vec3, WorldError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role an object plays in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ObjectKind {
    /// Static scenery: furniture, walls, perceived clutter.
    Environment,
}

/// Collision/visual shape of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Box centered at the object origin.
    Box { half_extents: Vec3 },
    /// Mesh file in the world's asset directory.
    ///
    /// A relative `path` is resolved against
    /// [`HostWorld::objects_asset_dir`]; the loader passes the bare file
    /// name.  An absolute `path` is used as-is.
    Mesh { path: PathBuf },
}

/// Everything a host world needs to create one object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub name: String,
    pub kind: ObjectKind,
    pub geometry: Geometry,
    pub pose: Pose,
    /// Uniform scale; `None` means 1.
    pub scale: Option<f64>,
    pub color: Option<Rgba>,
}

impl ObjectSpec {
    pub fn new(name: impl Into<String>, kind: ObjectKind, geometry: Geometry, pose: Pose) -> Self {
        Self {
            name: name.into(),
            kind,
            geometry,
            pose,
            scale: None,
            color: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_color(mut self, color: Option<Rgba>) -> Self {
        self.color = color;
        self
    }
}

/// Handle to an object created by a [`HostWorld`].
///
/// The world owns the object; the handle only remembers how it was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectHandle {
    id: Uuid,
    spec: ObjectSpec,
}

impl ObjectHandle {
    /// Wrap a spec the world has accepted.  Called by [`HostWorld`]
    /// implementations.
    pub fn new(spec: ObjectSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.spec.kind
    }

    pub fn geometry(&self) -> &Geometry {
        &self.spec.geometry
    }

    pub fn pose(&self) -> &Pose {
        &self.spec.pose
    }

    pub fn scale(&self) -> Option<f64> {
        self.spec.scale
    }

    pub fn color(&self) -> Option<Rgba> {
        self.spec.color
    }

    pub fn spec(&self) -> &ObjectSpec {
        &self.spec
    }
}

/// A simulation world that environment objects can be loaded into.
pub trait HostWorld {
    /// Directory the world resolves object mesh files against.
    fn objects_asset_dir(&self) -> &Path;

    /// Create an object and return its handle.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] when the world rejects the spec (e.g. a name
    /// clash or a mesh file it cannot find).
    fn create_object(&mut self, spec: ObjectSpec) -> Result<ObjectHandle, WorldError>;

    /// Destroy a previously created object.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownObject`] if the handle does not belong to
    /// a live object of this world.
    fn remove_object(&mut self, handle: &ObjectHandle) -> Result<(), WorldError>;
}
