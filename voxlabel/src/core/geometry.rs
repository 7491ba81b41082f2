use glam::{Mat3, Vec3};

use super::Dimensions;

/// Physical placement of a voxel grid.
///
/// Every pipeline stage hands the geometry on untouched, so the written volume lines
/// up with the volume it was extracted from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub dims: Dimensions,
    /// Voxel size along each axis.
    pub spacing: Vec3,
    /// Physical position of voxel `(0, 0, 0)`.
    pub origin: Vec3,
    /// Axis directions, one column per grid axis.
    pub direction: Mat3,
}

impl Geometry {
    /// Unit spacing, zero origin and identity direction.
    #[must_use]
    pub fn new(dims: Dimensions) -> Self {
        Self {
            dims,
            spacing: Vec3::ONE,
            origin: Vec3::ZERO,
            direction: Mat3::IDENTITY,
        }
    }

    #[must_use]
    pub fn with_spacing(mut self, spacing: Vec3) -> Self {
        self.spacing = spacing;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: Mat3) -> Self {
        self.direction = direction;
        self
    }

    /// Physical volume of one voxel.
    #[must_use]
    pub fn voxel_volume(&self) -> f32 {
        self.spacing.x * self.spacing.y * self.spacing.z
    }

    /// Maps a (possibly fractional) grid position to physical space.
    #[must_use]
    pub fn index_to_physical(&self, index: Vec3) -> Vec3 {
        self.origin + self.direction * (index * self.spacing)
    }
}
