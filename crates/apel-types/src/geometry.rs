//! Rigid-body primitives shared by the loader and the host world.
//!
//! Quaternions follow the `(x, y, z, w)` storage order used by ROS `tf`, so a
//! quaternion printed from a derived pose reads the same as one printed by the
//! perception pipeline that produced the manifest.
//!
//! # Example
//!
//! ```rust
//! use apel_types::geometry::{HomogeneousMatrix, Quaternion};
//!
//! let m = HomogeneousMatrix::from_rotation_row_major(&[
//!     1.0, 0.0, 0.0,
//!     0.0, 1.0, 0.0,
//!     0.0, 0.0, 1.0,
//! ]);
//! let q = m.to_quaternion();
//! assert_eq!(q, Quaternion::identity());
//! ```

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector (translation, extent, or vertex).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Component-wise minimum.
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    /// Component-wise maximum.
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A quaternion representing a 3-D rotation, stored as `(x, y, z, w)`.
///
/// Quaternions derived from a valid rotation matrix have unit norm.  Nothing
/// here normalises, so a malformed matrix yields a malformed quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Euclidean norm of the four components.
    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    /// Components in `(x, y, z, w)` order.
    pub fn to_xyzw(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HomogeneousMatrix
// ────────────────────────────────────────────────────────────────────────────

/// A 4x4 homogeneous transform, row-major (`m[row][col]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogeneousMatrix {
    pub m: [[f64; 4]; 4],
}

impl HomogeneousMatrix {
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        Self { m }
    }

    /// Embed a row-major 3x3 rotation as the top-left block of the identity.
    pub fn from_rotation_row_major(rotation: &[f64; 9]) -> Self {
        let mut out = Self::identity();
        for row in 0..3 {
            for col in 0..3 {
                out.m[row][col] = rotation[row * 3 + col];
            }
        }
        out
    }

    /// Convert the rotation block to a quaternion.
    ///
    /// Uses the trace method when the trace dominates `m[3][3]`; otherwise the
    /// largest diagonal element picks the branch, which keeps near-180°
    /// rotations away from a division by (almost) zero.
    pub fn to_quaternion(&self) -> Quaternion {
        let m = &self.m;
        let mut q = [0.0f64; 4];
        let mut t = m[0][0] + m[1][1] + m[2][2] + m[3][3];

        if t > m[3][3] {
            q[3] = t;
            q[2] = m[1][0] - m[0][1];
            q[1] = m[0][2] - m[2][0];
            q[0] = m[2][1] - m[1][2];
        } else {
            let (mut i, mut j, mut k) = (0, 1, 2);
            if m[1][1] > m[0][0] {
                (i, j, k) = (1, 2, 0);
            }
            if m[2][2] > m[i][i] {
                (i, j, k) = (2, 0, 1);
            }
            t = m[i][i] - (m[j][j] + m[k][k]) + m[3][3];
            q[i] = t;
            q[j] = m[i][j] + m[j][i];
            q[k] = m[k][i] + m[i][k];
            q[3] = m[k][j] - m[j][k];
        }

        let s = 0.5 / (t * m[3][3]).sqrt();
        Quaternion::new(q[0] * s, q[1] * s, q[2] * s, q[3] * s)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// Placement of an object in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
