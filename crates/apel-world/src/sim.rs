//! In-process simulation world for headless runs and CI.
//!
//! [`SimWorld`] implements [`HostWorld`] without any physics engine: it keeps
//! the accepted [`ObjectSpec`]s by name and applies the same admission checks
//! a real backend would (unique names, mesh present in the asset directory,
//! sane scale).
//!
//! # Example
//!
//! ```rust
//! use apel_types::{Pose, Vec3};
//! use apel_world::{Geometry, HostWorld, ObjectKind, ObjectSpec, SimWorld};
//!
//! let mut world = SimWorld::builder()
//!     .with_resources_path("/tmp/apel-resources")
//!     .build();
//!
//! let handle = world
//!     .create_object(ObjectSpec::new(
//!         "Table_0",
//!         ObjectKind::Environment,
//!         Geometry::Box { half_extents: Vec3::new(1.0, 0.5, 0.4) },
//!         Pose::identity(),
//!     ))
//!     .expect("sim create must succeed");
//! assert_eq!(world.len(), 1);
//! assert_eq!(handle.name(), "Table_0");
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use apel_types::WorldError;
use tracing::debug;

use crate::world::{Geometry, HostWorld, ObjectHandle, ObjectSpec};

/// Default resources root, relative to the working directory.
pub const DEFAULT_RESOURCES_PATH: &str = "../resources";

// ────────────────────────────────────────────────────────────────────────────
// SimWorld
// ────────────────────────────────────────────────────────────────────────────

/// A [`HostWorld`] that only records what it was asked to create.
#[derive(Debug)]
pub struct SimWorld {
    resources_path: PathBuf,
    objects_dir: PathBuf,
    objects: HashMap<String, ObjectHandle>,
    /// Names in creation order.
    order: Vec<String>,
}

impl SimWorld {
    /// Start building a [`SimWorld`].
    pub fn builder() -> SimWorldBuilder {
        SimWorldBuilder::default()
    }

    pub fn resources_path(&self) -> &Path {
        &self.resources_path
    }

    /// Look up a live object by name.
    pub fn get(&self, name: &str) -> Option<&ObjectHandle> {
        self.objects.get(name)
    }

    /// Live objects in creation order.
    pub fn objects(&self) -> impl Iterator<Item = &ObjectHandle> {
        self.order.iter().filter_map(|n| self.objects.get(n))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn admit(&self, spec: &ObjectSpec) -> Result<(), WorldError> {
        if self.objects.contains_key(&spec.name) {
            return Err(WorldError::DuplicateName(spec.name.clone()));
        }
        if let Some(scale) = spec.scale
            && !(scale.is_finite() && scale > 0.0)
        {
            return Err(WorldError::InvalidScale {
                name: spec.name.clone(),
                scale,
            });
        }
        if let Geometry::Mesh { path } = &spec.geometry {
            let resolved = if path.is_absolute() {
                path.clone()
            } else {
                self.objects_dir.join(path)
            };
            if !resolved.is_file() {
                return Err(WorldError::MissingAsset(resolved.display().to_string()));
            }
        }
        Ok(())
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        SimWorldBuilder::default().build()
    }
}

impl HostWorld for SimWorld {
    fn objects_asset_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn create_object(&mut self, spec: ObjectSpec) -> Result<ObjectHandle, WorldError> {
        self.admit(&spec)?;
        let handle = ObjectHandle::new(spec);
        debug!(name = handle.name(), id = %handle.id(), "sim object created");
        self.order.push(handle.name().to_string());
        self.objects
            .insert(handle.name().to_string(), handle.clone());
        Ok(handle)
    }

    fn remove_object(&mut self, handle: &ObjectHandle) -> Result<(), WorldError> {
        match self.objects.get(handle.name()) {
            Some(live) if live.id() == handle.id() => {
                self.objects.remove(handle.name());
                self.order.retain(|n| n != handle.name());
                debug!(name = handle.name(), "sim object removed");
                Ok(())
            }
            _ => Err(WorldError::UnknownObject(handle.name().to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimWorld builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`SimWorld`].
///
/// The objects asset directory is `<resources_path>/objects` unless set
/// explicitly with [`with_objects_dir`][Self::with_objects_dir].
#[derive(Default)]
pub struct SimWorldBuilder {
    resources_path: Option<PathBuf>,
    objects_dir: Option<PathBuf>,
}

impl SimWorldBuilder {
    /// Root of the world's resources.
    pub fn with_resources_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resources_path = Some(path.into());
        self
    }

    /// Override the objects asset directory.
    pub fn with_objects_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.objects_dir = Some(path.into());
        self
    }

    pub fn build(self) -> SimWorld {
        let resources_path = self
            .resources_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES_PATH));
        let objects_dir = self
            .objects_dir
            .unwrap_or_else(|| resources_path.join("objects"));
        SimWorld {
            resources_path,
            objects_dir,
            objects: HashMap::new(),
            order: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
