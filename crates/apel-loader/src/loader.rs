//! Environment Loader.
//!
//! Turns every record of an environment manifest into a simulation object in
//! a [`HostWorld`].
//!
//! # Manifest
//!
//! A JSON list of [`ObjectRecord`]s:
//!
//! ```json
//! [
//!   {"class": "Cup", "id": 1,
//!    "pose": {"position": [1, 2, 3], "rotation": [1, 0, 0, 0, 1, 0, 0, 0, 1]},
//!    "vertices": [[0, 0, 0], [2, 2, 2]]},
//!   {"class": "Mug", "id": 2,
//!    "pose": {"position": [0, 0, 0], "rotation": [1, 0, 0, 0, 1, 0, 0, 0, 1]},
//!    "obj_file": "mug.obj", "scale": [0.5]}
//! ]
//! ```
//!
//! Relative `obj_file` paths are resolved against the manifest's directory.
//!
//! # Loading paths
//!
//! | [`LoadMode`] | Per-record behaviour |
//! |---|---|
//! | `Generic` | Box from the vertex cloud's extents. Needs `vertices`. |
//! | `Mesh` | Copy `obj_file` into the world's asset directory, create a mesh object scaled by `scale[0]`. |
//! | `Auto` | `Mesh` when `obj_file` is present, `Generic` otherwise. |
//!
//! # Failure behaviour
//!
//! [`EnvironmentLoader::load_all`] stops at the first failing record and keeps
//! the objects already created.  [`EnvironmentLoader::load_all_atomic`]
//! removes them again before returning the error.  Copied mesh files are left
//! in the asset directory either way.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use apel_types::{ObjectRecord, Rgba};
use apel_world::{Geometry, HostWorld, ObjectHandle, ObjectKind, ObjectSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::LoadError;
use crate::shape::{half_extents, parse_pose};

// ────────────────────────────────────────────────────────────────────────────
// LoadMode
// ────────────────────────────────────────────────────────────────────────────

/// Which loading path [`EnvironmentLoader::load_all_with`] takes per record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    #[default]
    Generic,
    Mesh,
    Auto,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Generic => write!(f, "generic"),
            LoadMode::Mesh => write!(f, "mesh"),
            LoadMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" => Ok(LoadMode::Generic),
            "mesh" => Ok(LoadMode::Mesh),
            "auto" => Ok(LoadMode::Auto),
            other => Err(format!(
                "unknown load mode '{other}' (expected generic, mesh or auto)"
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EnvironmentLoader
// ────────────────────────────────────────────────────────────────────────────

/// Loads the objects of one manifest into a borrowed [`HostWorld`].
///
/// The manifest is read once in [`new`][Self::new] and never changes.
/// Created handles accumulate in [`objects`][Self::objects] in creation order.
pub struct EnvironmentLoader<'w, W: HostWorld + ?Sized> {
    manifest_path: PathBuf,
    env_dir: PathBuf,
    records: Vec<ObjectRecord>,
    objects: Vec<ObjectHandle>,
    world: &'w mut W,
}

impl<'w, W: HostWorld + ?Sized> EnvironmentLoader<'w, W> {
    /// Read and parse the manifest at `manifest_path`.
    ///
    /// # Errors
    ///
    /// [`LoadError::ManifestRead`] if the file cannot be read,
    /// [`LoadError::ManifestParse`] if it is not a JSON list of object
    /// records.
    pub fn new(manifest_path: impl AsRef<Path>, world: &'w mut W) -> Result<Self, LoadError> {
        let manifest_path = manifest_path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&manifest_path).map_err(|source| LoadError::ManifestRead {
            path: manifest_path.clone(),
            source,
        })?;
        let records: Vec<ObjectRecord> =
            serde_json::from_str(&raw).map_err(|source| LoadError::ManifestParse {
                path: manifest_path.clone(),
                source,
            })?;
        let env_dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        info!(
            manifest = %manifest_path.display(),
            records = records.len(),
            "environment manifest loaded"
        );

        Ok(Self {
            manifest_path,
            env_dir,
            records,
            objects: Vec::new(),
            world,
        })
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory relative mesh paths are resolved against.
    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    /// Records of the manifest, in file order.
    pub fn records(&self) -> &[ObjectRecord] {
        &self.records
    }

    /// Handles created so far, in creation order.
    pub fn objects(&self) -> &[ObjectHandle] {
        &self.objects
    }

    pub fn world(&self) -> &W {
        &*self.world
    }

    /// Give up the borrow of the world and keep the handles.
    pub fn into_objects(self) -> Vec<ObjectHandle> {
        self.objects
    }

    /// Load every record as a box-shaped object.
    ///
    /// Stops at the first failing record; objects created before it stay in
    /// the world and in [`objects`][Self::objects].
    pub fn load_all(&mut self) -> Result<&[ObjectHandle], LoadError> {
        self.load_all_with(LoadMode::Generic)
    }

    /// Load every record with the given [`LoadMode`].
    #[instrument(skip(self), fields(manifest = %self.manifest_path.display()))]
    pub fn load_all_with(&mut self, mode: LoadMode) -> Result<&[ObjectHandle], LoadError> {
        for idx in 0..self.records.len() {
            self.load_record(idx, mode)?;
        }
        info!(objects = self.objects.len(), %mode, "environment loaded");
        Ok(&self.objects)
    }

    /// Load every record with the given [`LoadMode`], all or nothing.
    ///
    /// On the first failure every object created by this call is removed from
    /// the world (newest first) and the original error is returned.
    #[instrument(skip(self), fields(manifest = %self.manifest_path.display()))]
    pub fn load_all_atomic(&mut self, mode: LoadMode) -> Result<&[ObjectHandle], LoadError> {
        let start = self.objects.len();
        for idx in 0..self.records.len() {
            if let Err(err) = self.load_record(idx, mode) {
                self.rollback(start);
                return Err(err);
            }
        }
        info!(objects = self.objects.len(), %mode, "environment loaded atomically");
        Ok(&self.objects)
    }

    /// Load the manifest record at `index` with the given [`LoadMode`].
    ///
    /// This is the way to load a single record of this loader's own
    /// manifest: [`records`][Self::records] borrows the loader, so passing one
    /// of its entries to [`load_object`][Self::load_object] needs a clone.
    ///
    /// # Errors
    ///
    /// [`LoadError::NoSuchRecord`] if `index` is out of range, otherwise as
    /// [`load_object`][Self::load_object].
    pub fn load_record(&mut self, index: usize, mode: LoadMode) -> Result<ObjectHandle, LoadError> {
        let record = self.records.get(index).ok_or(LoadError::NoSuchRecord {
            index,
            len: self.records.len(),
        })?;
        let spec = self.prepare_spec(record, mode)?;
        self.create(spec)
    }

    /// Load one record with the given [`LoadMode`].
    ///
    /// `record` need not come from this loader's manifest.  For one that
    /// does, use [`load_record`][Self::load_record].
    pub fn load_object(
        &mut self,
        record: &ObjectRecord,
        mode: LoadMode,
    ) -> Result<ObjectHandle, LoadError> {
        let spec = self.prepare_spec(record, mode)?;
        self.create(spec)
    }

    /// Create a box-shaped environment object from `record.vertices`.
    ///
    /// # Errors
    ///
    /// [`LoadError::MissingField`] without `vertices`,
    /// [`LoadError::EmptyVertices`] when the list is empty.
    pub fn load_generic_object(&mut self, record: &ObjectRecord) -> Result<ObjectHandle, LoadError> {
        let spec = self.generic_spec(record)?;
        self.create(spec)
    }

    /// Copy `record.obj_file` into the world's asset directory and create a
    /// mesh-backed environment object scaled by `record.scale[0]`.
    ///
    /// # Errors
    ///
    /// [`LoadError::MissingField`] without `obj_file` or `scale`,
    /// [`LoadError::AssetCopy`] if the mesh cannot be copied.
    pub fn load_mesh_object(&mut self, record: &ObjectRecord) -> Result<ObjectHandle, LoadError> {
        let spec = self.mesh_spec(record)?;
        self.create(spec)
    }

    /// Copy a mesh file (relative to the manifest directory) into the world's
    /// objects asset directory, keeping its file name.  Overwrites any file
    /// already there.  Returns the destination path.
    pub fn copy_mesh_asset(&self, obj_file: &str) -> Result<PathBuf, LoadError> {
        let from = self.env_dir.join(obj_file);
        let asset_dir = self.world.objects_asset_dir();
        let copy_err = |to: PathBuf, source| LoadError::AssetCopy {
            from: from.clone(),
            to,
            source,
        };

        let Some(file_name) = Path::new(obj_file).file_name() else {
            return Err(copy_err(
                asset_dir.to_path_buf(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "mesh path has no file name"),
            ));
        };
        let to = asset_dir.join(file_name);

        fs::create_dir_all(asset_dir).map_err(|e| copy_err(to.clone(), e))?;

        // fs::copy onto itself truncates the file before reading it.
        if let (Ok(a), Ok(b)) = (from.canonicalize(), to.canonicalize())
            && a == b
        {
            debug!(path = %to.display(), "mesh already in asset directory");
            return Ok(to);
        }

        fs::copy(&from, &to).map_err(|e| copy_err(to.clone(), e))?;
        debug!(from = %from.display(), to = %to.display(), "mesh copied");
        Ok(to)
    }

    // ────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ────────────────────────────────────────────────────────────────────

    fn prepare_spec(&self, record: &ObjectRecord, mode: LoadMode) -> Result<ObjectSpec, LoadError> {
        match mode {
            LoadMode::Generic => self.generic_spec(record),
            LoadMode::Mesh => self.mesh_spec(record),
            LoadMode::Auto if record.obj_file.is_some() => self.mesh_spec(record),
            LoadMode::Auto => self.generic_spec(record),
        }
    }

    #[instrument(level = "debug", skip_all, fields(object = %record.object_name()))]
    fn generic_spec(&self, record: &ObjectRecord) -> Result<ObjectSpec, LoadError> {
        let name = record.object_name();
        let vertices = record.vertices.as_deref().ok_or_else(|| LoadError::MissingField {
            object: name.clone(),
            field: "vertices",
        })?;
        let half_extents = half_extents(vertices).ok_or_else(|| LoadError::EmptyVertices {
            object: name.clone(),
        })?;
        debug!(?half_extents, "box extents computed");

        let color = parse_color(record, &name)?;
        Ok(ObjectSpec::new(
            name,
            ObjectKind::Environment,
            Geometry::Box { half_extents },
            parse_pose(&record.pose),
        )
        .with_color(color))
    }

    #[instrument(level = "debug", skip_all, fields(object = %record.object_name()))]
    fn mesh_spec(&self, record: &ObjectRecord) -> Result<ObjectSpec, LoadError> {
        let name = record.object_name();
        let missing = |field| LoadError::MissingField {
            object: name.clone(),
            field,
        };
        let obj_file = record.obj_file.as_deref().ok_or_else(|| missing("obj_file"))?;
        let scale = record
            .scale
            .as_ref()
            .and_then(|s| s.first().copied())
            .ok_or_else(|| missing("scale"))?;
        let color = parse_color(record, &name)?;

        let copied = self.copy_mesh_asset(obj_file)?;
        // The world resolves bare file names against its own asset directory.
        let path = copied.file_name().map(PathBuf::from).unwrap_or(copied);
        Ok(ObjectSpec::new(
            name,
            ObjectKind::Environment,
            Geometry::Mesh { path },
            parse_pose(&record.pose),
        )
        .with_scale(scale)
        .with_color(color))
    }

    fn create(&mut self, spec: ObjectSpec) -> Result<ObjectHandle, LoadError> {
        let handle = self.world.create_object(spec)?;
        info!(name = handle.name(), id = %handle.id(), "object created");
        self.objects.push(handle.clone());
        Ok(handle)
    }

    fn rollback(&mut self, start: usize) {
        let created = self.objects.split_off(start);
        warn!(objects = created.len(), "rolling back partially loaded environment");
        for handle in created.iter().rev() {
            if let Err(e) = self.world.remove_object(handle) {
                warn!(name = handle.name(), error = %e, "failed to remove object during rollback");
            }
        }
    }
}

fn parse_color(record: &ObjectRecord, name: &str) -> Result<Option<Rgba>, LoadError> {
    record
        .color
        .as_deref()
        .map(|hex| Rgba::from_hex(hex, 1.0))
        .transpose()
        .map_err(|source| LoadError::InvalidColor {
            object: name.to_string(),
            source,
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use apel_types::{Quaternion, WorldError};
    use apel_world::SimWorld;
    use tempfile::TempDir;

    const IDENTITY: &str = "[1,0,0,0,1,0,0,0,1]";

    struct Fixture {
        scene: TempDir,
        resources: TempDir,
    }

    impl Fixture {
        fn new(manifest: &str) -> Self {
            let scene = tempfile::tempdir().expect("scene dir");
            let resources = tempfile::tempdir().expect("resources dir");
            fs::write(scene.path().join("scene.json"), manifest).expect("write manifest");
            Self { scene, resources }
        }

        fn with_file(self, name: &str, contents: &str) -> Self {
            fs::write(self.scene.path().join(name), contents).expect("write scene file");
            self
        }

        fn manifest(&self) -> PathBuf {
            self.scene.path().join("scene.json")
        }

        fn world(&self) -> SimWorld {
            SimWorld::builder()
                .with_resources_path(self.resources.path())
                .build()
        }
    }

    fn cup(id: i64, vertices: &str) -> String {
        format!(
            r#"{{"class":"Cup","id":{id},"pose":{{"position":[1,2,3],"rotation":{IDENTITY}}},"vertices":{vertices}}}"#
        )
    }

    fn mug(id: i64, obj_file: &str, scale: &str) -> String {
        format!(
            r#"{{"class":"Mug","id":{id},"pose":{{"position":[0,0,0],"rotation":{IDENTITY}}},"obj_file":"{obj_file}","scale":{scale}}}"#
        )
    }

    #[test]
    fn cup_example_loads_as_box() {
        let fx = Fixture::new(&format!("[{}]", cup(1, "[[0,0,0],[2,2,2]]")));
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let objects = loader.load_all().unwrap();
        assert_eq!(objects.len(), 1);
        let h = &objects[0];
        assert_eq!(h.name(), "Cup_1");
        assert_eq!(h.kind(), ObjectKind::Environment);
        match h.geometry() {
            Geometry::Box { half_extents } => assert_eq!(half_extents.to_array(), [2.0, 2.0, 2.0]),
            other => panic!("expected box, got {other:?}"),
        }
        assert_eq!(h.pose().position.to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(h.pose().orientation, Quaternion::identity());
        assert!(h.scale().is_none());
    }

    #[test]
    fn load_all_creates_one_object_per_record_in_order() {
        let manifest = format!(
            "[{},{},{}]",
            cup(3, "[[0,0,0],[1,1,1]]"),
            cup(1, "[[0,0,0],[1,2,3]]"),
            cup(2, "[[-1,0,0],[1,1,1]]")
        );
        let fx = Fixture::new(&manifest);
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let names: Vec<String> = loader
            .load_all()
            .unwrap()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, ["Cup_3", "Cup_1", "Cup_2"]);
        assert_eq!(loader.objects().len(), loader.records().len());
        drop(loader);
        assert_eq!(world.len(), 3);
    }

    #[test]
    fn mug_example_copies_asset_and_scales() {
        let fx = Fixture::new(&format!("[{}]", mug(2, "mug.obj", "[0.5, 2.0]")))
            .with_file("mug.obj", "o mug\nv 0 0 0\n");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let handle = loader.load_record(0, LoadMode::Mesh).unwrap();

        let copied = fx.resources.path().join("objects").join("mug.obj");
        assert_eq!(fs::read_to_string(&copied).unwrap(), "o mug\nv 0 0 0\n");
        assert_eq!(handle.name(), "Mug_2");
        assert_eq!(handle.scale(), Some(0.5));
        assert_eq!(
            handle.geometry(),
            &Geometry::Mesh {
                path: PathBuf::from("mug.obj")
            }
        );
    }

    #[test]
    fn mesh_copy_is_idempotent() {
        let fx = Fixture::new("[]").with_file("table.obj", "o table\n");
        let mut world = fx.world();
        let loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let first = loader.copy_mesh_asset("table.obj").unwrap();
        let second = loader.copy_mesh_asset("table.obj").unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read(&second).unwrap(), b"o table\n");
    }

    #[test]
    fn mesh_copy_into_own_directory_keeps_contents() {
        let fx = Fixture::new("[]").with_file("shelf.obj", "o shelf\n");
        let mut world = SimWorld::builder().with_objects_dir(fx.scene.path()).build();
        let loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let to = loader.copy_mesh_asset("shelf.obj").unwrap();
        assert_eq!(fs::read_to_string(to).unwrap(), "o shelf\n");
    }

    #[test]
    fn mesh_loads_with_relative_resources_path() {
        let fx = Fixture::new(&format!("[{}]", mug(3, "mug.obj", "[1.0]")))
            .with_file("mug.obj", "o mug\n");
        let cwd = std::env::current_dir().expect("cwd");
        let resources = tempfile::Builder::new()
            .prefix("apel-res-")
            .tempdir_in(&cwd)
            .expect("resources dir");
        let relative = PathBuf::from(resources.path().file_name().expect("dir name"));
        assert!(relative.is_relative());

        let mut world = SimWorld::builder().with_resources_path(&relative).build();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        let objects = loader.load_all_with(LoadMode::Mesh).unwrap();

        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].geometry(),
            &Geometry::Mesh {
                path: PathBuf::from("mug.obj")
            }
        );
        assert!(resources.path().join("objects/mug.obj").is_file());
    }

    #[test]
    fn unwritable_asset_dir_is_asset_copy_error() {
        let fx = Fixture::new(&format!("[{}]", mug(1, "mug.obj", "[1.0]")))
            .with_file("mug.obj", "o mug\n");
        // A plain file where the objects directory should be.
        fs::write(fx.resources.path().join("objects"), "not a dir").expect("write blocker");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let err = loader.load_record(0, LoadMode::Mesh).unwrap_err();
        match err {
            LoadError::AssetCopy { from, to, .. } => {
                assert_eq!(from, fx.scene.path().join("mug.obj"));
                assert_eq!(to, fx.resources.path().join("objects/mug.obj"));
            }
            other => panic!("expected AssetCopy, got {other:?}"),
        }
        assert!(loader.objects().is_empty());
    }

    #[test]
    fn missing_mesh_file_is_asset_copy_error() {
        let fx = Fixture::new(&format!("[{}]", mug(1, "ghost.obj", "[1.0]")));
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let err = loader.load_all_with(LoadMode::Mesh).unwrap_err();
        assert!(matches!(err, LoadError::AssetCopy { .. }), "got {err:?}");
    }

    #[test]
    fn mesh_loading_requires_obj_file_and_scale() {
        let no_scale = format!(
            r#"[{{"class":"Mug","id":1,"pose":{{"position":[0,0,0],"rotation":{IDENTITY}}},"obj_file":"mug.obj"}}]"#
        );
        let fx = Fixture::new(&no_scale).with_file("mug.obj", "o mug\n");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        assert!(matches!(
            loader.load_record(0, LoadMode::Mesh),
            Err(LoadError::MissingField { field: "scale", .. })
        ));

        let empty_scale = Fixture::new(&format!("[{}]", mug(1, "mug.obj", "[]")))
            .with_file("mug.obj", "o mug\n");
        let mut world = empty_scale.world();
        let mut loader = EnvironmentLoader::new(empty_scale.manifest(), &mut world).unwrap();
        assert!(matches!(
            loader.load_record(0, LoadMode::Mesh),
            Err(LoadError::MissingField { field: "scale", .. })
        ));

        // A record from outside the manifest goes straight to the per-path call.
        let box_only: ObjectRecord = serde_json::from_str(&cup(1, "[[0,0,0]]")).unwrap();
        assert!(matches!(
            loader.load_mesh_object(&box_only),
            Err(LoadError::MissingField { field: "obj_file", .. })
        ));
    }

    #[test]
    fn generic_loading_requires_vertices() {
        let fx = Fixture::new(&format!("[{}]", mug(1, "mug.obj", "[1.0]")));
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        let err = loader.load_all().unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingField { field: "vertices", .. }
        ));
    }

    #[test]
    fn empty_vertices_error() {
        let fx = Fixture::new("[]");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        let record: ObjectRecord = serde_json::from_str(&cup(1, "[]")).unwrap();
        let err = loader.load_generic_object(&record).unwrap_err();
        assert!(matches!(err, LoadError::EmptyVertices { ref object } if object == "Cup_1"));
    }

    #[test]
    fn auto_mode_picks_path_per_record() {
        let manifest = format!("[{},{}]", cup(1, "[[0,0,0],[1,1,1]]"), mug(2, "mug.obj", "[2.0]"));
        let fx = Fixture::new(&manifest).with_file("mug.obj", "o mug\n");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let objects = loader.load_all_with(LoadMode::Auto).unwrap();
        assert!(matches!(objects[0].geometry(), Geometry::Box { .. }));
        assert!(matches!(objects[1].geometry(), Geometry::Mesh { .. }));
        assert_eq!(objects[1].scale(), Some(2.0));
    }

    #[test]
    fn load_all_keeps_partial_progress() {
        let manifest = format!("[{},{}]", cup(1, "[[0,0,0],[1,1,1]]"), cup(2, "[]"));
        let fx = Fixture::new(&manifest);
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        assert!(loader.load_all().is_err());
        assert_eq!(loader.objects().len(), 1);
        drop(loader);
        assert!(world.get("Cup_1").is_some());
    }

    #[test]
    fn load_all_atomic_rolls_back() {
        let manifest = format!(
            "[{},{},{}]",
            cup(1, "[[0,0,0],[1,1,1]]"),
            cup(2, "[[0,0,0],[1,1,1]]"),
            cup(3, "[]")
        );
        let fx = Fixture::new(&manifest);
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let err = loader.load_all_atomic(LoadMode::Generic).unwrap_err();
        assert!(matches!(err, LoadError::EmptyVertices { .. }));
        assert!(loader.objects().is_empty());
        drop(loader);
        assert!(world.is_empty());
    }

    #[test]
    fn load_all_atomic_keeps_earlier_batches() {
        let fx = Fixture::new(&format!("[{}]", cup(1, "[[0,0,0],[1,1,1]]")));
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        loader.load_all_atomic(LoadMode::Generic).unwrap();
        // Second pass clashes on the name; the first batch must survive.
        let err = loader.load_all_atomic(LoadMode::Generic).unwrap_err();
        assert!(matches!(err, LoadError::World(WorldError::DuplicateName(_))));
        assert_eq!(loader.objects().len(), 1);
        drop(loader);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn color_is_parsed_and_validated() {
        let ok = format!(
            r##"[{{"class":"Bowl","id":4,"pose":{{"position":[0,0,0],"rotation":{IDENTITY}}},"vertices":[[0,0,0]],"color":"#ff0000"}}]"##
        );
        let fx = Fixture::new(&ok);
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        let objects = loader.load_all().unwrap();
        assert_eq!(objects[0].color(), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));

        let bad = ok.replace("#ff0000", "red");
        let fx = Fixture::new(&bad);
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        assert!(matches!(
            loader.load_all(),
            Err(LoadError::InvalidColor { .. })
        ));
    }

    #[test]
    fn demo_bundle_loads() {
        let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../demos/scene_bundle_1/scene.json");

        let resources = tempfile::tempdir().expect("resources dir");
        let mut world = SimWorld::builder()
            .with_resources_path(resources.path())
            .build();
        let mut loader = EnvironmentLoader::new(&manifest, &mut world).unwrap();
        assert_eq!(loader.records().len(), 3);
        let objects = loader.load_all().unwrap();
        assert_eq!(objects.len(), 3);
        assert!(objects.iter().all(|h| matches!(h.geometry(), Geometry::Box { .. })));

        let resources = tempfile::tempdir().expect("resources dir");
        let mut world = SimWorld::builder()
            .with_resources_path(resources.path())
            .build();
        let mut loader = EnvironmentLoader::new(&manifest, &mut world).unwrap();
        let objects = loader.load_all_with(LoadMode::Auto).unwrap();
        let mug = &objects[1];
        assert_eq!(mug.name(), "Mug_1");
        assert_eq!(mug.scale(), Some(0.5));
        assert!(mug.color().is_some());
        assert!(resources.path().join("objects/mug.obj").is_file());

        // The table has no mesh, so a pure mesh load stops at the first record.
        let resources = tempfile::tempdir().expect("resources dir");
        let mut world = SimWorld::builder()
            .with_resources_path(resources.path())
            .build();
        let mut loader = EnvironmentLoader::new(&manifest, &mut world).unwrap();
        assert!(matches!(
            loader.load_all_with(LoadMode::Mesh),
            Err(LoadError::MissingField { field: "obj_file", .. })
        ));
        assert!(loader.objects().is_empty());
    }

    #[test]
    fn load_object_dispatches_on_mode() {
        let fx = Fixture::new("[]").with_file("mug.obj", "o mug\n");
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        let record: ObjectRecord = serde_json::from_str(&mug(7, "mug.obj", "[1.5]")).unwrap();

        assert!(matches!(
            loader.load_object(&record, LoadMode::Generic),
            Err(LoadError::MissingField { field: "vertices", .. })
        ));
        let handle = loader.load_object(&record, LoadMode::Auto).unwrap();
        assert_eq!(handle.scale(), Some(1.5));
        assert_eq!(loader.into_objects().len(), 1);
    }

    #[test]
    fn load_record_checks_the_index() {
        let fx = Fixture::new(&format!(
            "[{},{}]",
            cup(1, "[[0,0,0],[1,1,1]]"),
            cup(2, "[[0,0,0],[2,2,2]]")
        ));
        let mut world = fx.world();
        let mut loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();

        let handle = loader.load_record(1, LoadMode::Generic).unwrap();
        assert_eq!(handle.name(), "Cup_2");
        assert!(matches!(
            loader.load_record(2, LoadMode::Generic),
            Err(LoadError::NoSuchRecord { index: 2, len: 2 })
        ));
        assert_eq!(loader.objects().len(), 1);
    }

    #[test]
    fn missing_manifest_is_read_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let mut world = SimWorld::default();
        let err = EnvironmentLoader::new(dir.path().join("nope.json"), &mut world)
            .err()
            .expect("must fail");
        assert!(matches!(err, LoadError::ManifestRead { .. }));
    }

    #[test]
    fn malformed_manifests_are_parse_errors() {
        for bad in [
            "not json",
            r#"{"class":"Cup"}"#,
            r#"[{"class":"Cup","id":1}]"#,
            r#"[{"class":"Cup","id":"one","pose":{"position":[0,0,0],"rotation":[1,0,0,0,1,0,0,0,1]}}]"#,
            "[1, 2, 3]",
        ] {
            let fx = Fixture::new(bad);
            let mut world = fx.world();
            let err = EnvironmentLoader::new(fx.manifest(), &mut world)
                .err()
                .expect("must fail");
            assert!(matches!(err, LoadError::ManifestParse { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn env_dir_is_manifest_parent() {
        let fx = Fixture::new("[]");
        let mut world = fx.world();
        let loader = EnvironmentLoader::new(fx.manifest(), &mut world).unwrap();
        assert_eq!(loader.env_dir(), fx.scene.path());
        assert!(loader.records().is_empty());
        assert!(loader.world().is_empty());
    }

    #[test]
    fn load_mode_parses_case_insensitively() {
        assert_eq!("Mesh".parse::<LoadMode>(), Ok(LoadMode::Mesh));
        assert_eq!(" auto ".parse::<LoadMode>(), Ok(LoadMode::Auto));
        assert!("boxes".parse::<LoadMode>().is_err());
        assert_eq!(LoadMode::default().to_string(), "generic");
    }
}
