//! # Pose Math
//!
//! The camera pose types shared by the master and every display server.
//!
//! Poses travel over the wire as IEEE-754 f64, so the math here is f64
//! end to end. The types are `Pod` so they can be stored in pre-allocated
//! buffers without indirection.

use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Sub};

/// A 3-component f64 vector.
///
/// Used both for positions (world units) and for orientations
/// (heading/pitch/roll in degrees).
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<[f64; 3]> for Vec3 {
    #[inline]
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Vec3> for [f64; 3] {
    #[inline]
    fn from(v: Vec3) -> Self {
        [v.x, v.y, v.z]
    }
}

/// A camera pose in the shared world frame.
///
/// `pos` is the position in world units; `hpr` is the orientation as
/// heading/pitch/roll in degrees. Every display in the wall renders from
/// this pose shifted by its fixed per-display offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CameraPose {
    /// Position (x, y, z) in world units.
    pub pos: Vec3,
    /// Orientation (heading, pitch, roll) in degrees.
    pub hpr: Vec3,
}

impl CameraPose {
    /// The identity pose: origin, no rotation.
    pub const IDENTITY: Self = Self::new(Vec3::ZERO, Vec3::ZERO);

    /// Creates a pose from position and orientation.
    #[inline]
    #[must_use]
    pub const fn new(pos: Vec3, hpr: Vec3) -> Self {
        Self { pos, hpr }
    }

    /// Applies a fixed per-display offset to this pose.
    ///
    /// Both halves compose componentwise: the offset position shifts the
    /// eye point, the offset hpr tilts the frustum. This is how one shared
    /// world pose becomes N adjacent view frustums.
    #[inline]
    #[must_use]
    pub fn offset_by(&self, offset: &Self) -> Self {
        Self::new(self.pos + offset.pos, self.hpr + offset.hpr)
    }
}
