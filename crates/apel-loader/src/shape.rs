//! Pose and extent derivation for manifest records.
//!
//! # Extents
//!
//! [`half_extents`] returns `max - min` per axis, i.e. the *full* size of the
//! vertex cloud's bounding box.  Existing scenes were authored against that
//! behaviour, so box objects come out twice the size of the detection on each
//! axis.  Callers that want the geometric half-size divide by two themselves.

use apel_types::{HomogeneousMatrix, Pose, PoseRecord, Vec3};
use tracing::trace;

/// Convert a manifest pose into a world [`Pose`].
///
/// The rotation is embedded in a 4x4 identity and converted to a quaternion.
/// The position is copied verbatim.  Nothing is validated: a non-orthonormal
/// rotation yields a non-unit (or NaN) quaternion.
pub fn parse_pose(record: &PoseRecord) -> Pose {
    let orientation = HomogeneousMatrix::from_rotation_row_major(&record.rotation).to_quaternion();
    trace!(?orientation, "rotation converted");
    Pose::new(Vec3::from(record.position), orientation)
}

/// Per-axis `max - min` over `vertices`, or `None` when there are none.
pub fn half_extents(vertices: &[[f64; 3]]) -> Option<Vec3> {
    let (first, rest) = vertices.split_first()?;
    let first = Vec3::from(*first);
    let (min, max) = rest.iter().fold((first, first), |(lo, hi), v| {
        let v = Vec3::from(*v);
        (lo.min(v), hi.max(v))
    });
    Some(max.sub(min))
}
