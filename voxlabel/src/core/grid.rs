//! Module `core::grid`
//!
//! Dense voxel storage. A [`VoxelGrid`] owns one [`Label`] per voxel in x-fastest order
//! together with the [`Geometry`] it was read with.
//!
//! # Examples
//!
//! ```rust
//! use glam::UVec3;
//! use voxlabel::{Dimensions, Geometry, VoxelGrid};
//!
//! let mut grid = VoxelGrid::new(Geometry::new(Dimensions::new(4, 4, 4)));
//! grid.set(UVec3::new(1, 2, 3), 5).unwrap();
//!
//! assert_eq!(grid.get(UVec3::new(1, 2, 3)), Some(5));
//! assert_eq!(grid.labels_present(), vec![5]);
//! ```

use std::collections::BTreeSet;

use glam::UVec3;

use crate::{LabelMap, relabel::ChangeMap};

use super::{BACKGROUND, Dimensions, Geometry, Label};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    #[error("voxel buffer holds {actual} values but {dims} requires {expected}")]
    BufferSize {
        dims: Dimensions,
        expected: usize,
        actual: usize,
    },

    #[error("position {position} is outside of {dims}")]
    OutOfBounds { position: UVec3, dims: Dimensions },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    geometry: Geometry,
    voxels: Vec<Label>,
}

impl VoxelGrid {
    /// Creates a grid with every voxel set to [`BACKGROUND`].
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            voxels: vec![BACKGROUND; geometry.dims.len()],
            geometry,
        }
    }

    /// Wraps an existing x-fastest voxel buffer.
    ///
    /// # Errors
    /// - [`GridError::BufferSize`] when `voxels.len()` differs from the voxel count of
    ///   `geometry.dims`.
    pub fn from_voxels(geometry: Geometry, voxels: Vec<Label>) -> Result<Self, GridError> {
        let expected = geometry.dims.len();
        if voxels.len() != expected {
            return Err(GridError::BufferSize {
                dims: geometry.dims,
                expected,
                actual: voxels.len(),
            });
        }

        Ok(Self { geometry, voxels })
    }

    #[must_use]
    #[inline(always)]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    #[inline(always)]
    pub fn dims(&self) -> Dimensions {
        self.geometry.dims
    }

    #[must_use]
    #[inline(always)]
    pub fn voxels(&self) -> &[Label] {
        &self.voxels
    }

    #[must_use]
    #[inline(always)]
    pub fn voxels_mut(&mut self) -> &mut [Label] {
        &mut self.voxels
    }

    #[must_use]
    pub fn into_voxels(self) -> Vec<Label> {
        self.voxels
    }

    #[must_use]
    pub fn get(&self, position: UVec3) -> Option<Label> {
        self.geometry
            .dims
            .index(position)
            .map(|index| self.voxels[index])
    }

    /// Writes a single voxel.
    ///
    /// # Errors
    /// - [`GridError::OutOfBounds`] when `position` lies outside the grid.
    pub fn set(&mut self, position: UVec3, label: Label) -> Result<(), GridError> {
        let dims = self.geometry.dims;
        let index = dims
            .index(position)
            .ok_or(GridError::OutOfBounds { position, dims })?;

        self.voxels[index] = label;

        Ok(())
    }

    /// Sorted list of the non-background labels occurring in the grid.
    #[must_use]
    pub fn labels_present(&self) -> Vec<Label> {
        let labels: BTreeSet<Label> = self
            .voxels
            .iter()
            .copied()
            .filter(|&label| label != BACKGROUND)
            .collect();

        labels.into_iter().collect()
    }

    /// Number of voxels carrying `label`.
    #[must_use]
    pub fn count(&self, label: Label) -> usize {
        self.voxels.iter().filter(|&&voxel| voxel == label).count()
    }

    /// Converts the grid into its sparse representation, one object per label.
    #[must_use]
    pub fn into_label_map(self) -> LabelMap {
        LabelMap::from_grid(&self)
    }

    /// Rewrites every voxel through `changes`; unmapped values pass through.
    #[must_use]
    pub fn relabel(mut self, changes: &ChangeMap) -> Self {
        if changes.is_empty() {
            return self;
        }

        let table = changes.lookup_table();
        for voxel in self.voxels.iter_mut() {
            *voxel = table[*voxel as usize];
        }

        self
    }
}
