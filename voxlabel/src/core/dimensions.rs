//! Module `core::dimensions`
//!
//! Defines the [`Dimensions`] struct, the voxel extent of a grid along each axis.
//!
//! Voxels are laid out x-fastest: the linear index of `(x, y, z)` is
//! `x + size.x * (y + size.y * z)`.
//!
//! # Examples
//!
//! ```rust
//! use glam::UVec3;
//! use voxlabel::Dimensions;
//!
//! let dims = Dimensions::new(4, 3, 2);
//! assert_eq!(dims.len(), 24);
//! assert_eq!(dims.index(UVec3::new(1, 2, 1)), Some(21));
//! ```

use glam::UVec3;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions(UVec3);

impl From<Dimensions> for UVec3 {
    #[inline]
    fn from(dims: Dimensions) -> UVec3 {
        dims.0
    }
}

impl From<UVec3> for Dimensions {
    #[inline]
    fn from(size: UVec3) -> Self {
        Self(size)
    }
}

/// Display implementation for [`Dimensions`] in the usual `XxYxZ` form
impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.0.x, self.0.y, self.0.z)
    }
}

impl Dimensions {
    /// Creates new [`Dimensions`] from the extent along each axis.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use voxlabel::Dimensions;
    ///
    /// let dims = Dimensions::new(8, 8, 4);
    /// assert_eq!(dims.size().z, 4);
    /// ```
    #[must_use]
    #[inline(always)]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self(UVec3::new(x, y, z))
    }

    /// Returns the extent as a [`UVec3`].
    #[must_use]
    #[inline(always)]
    pub const fn size(&self) -> UVec3 {
        self.0
    }

    /// Returns the total number of voxels.
    #[must_use]
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.0.x as usize * self.0.y as usize * self.0.z as usize
    }

    /// Returns the total number of voxels, or `None` when it does not fit into `usize`.
    ///
    /// Use this for extents that come from untrusted input.
    #[must_use]
    #[inline(always)]
    pub const fn checked_len(&self) -> Option<usize> {
        match (self.0.x as usize).checked_mul(self.0.y as usize) {
            Some(xy) => xy.checked_mul(self.0.z as usize),
            None => None,
        }
    }

    /// Returns `true` when any axis has zero extent.
    #[must_use]
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` when `position` lies inside the grid.
    #[must_use]
    #[inline(always)]
    pub fn contains(&self, position: UVec3) -> bool {
        position.cmplt(self.0).all()
    }

    /// Returns the linear (x-fastest) index of `position`, or `None` when it lies outside.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use glam::UVec3;
    /// use voxlabel::Dimensions;
    ///
    /// let dims = Dimensions::new(2, 2, 2);
    /// assert_eq!(dims.index(UVec3::new(1, 1, 1)), Some(7));
    /// assert_eq!(dims.index(UVec3::new(2, 0, 0)), None);
    /// ```
    #[must_use]
    #[inline(always)]
    pub fn index(&self, position: UVec3) -> Option<usize> {
        if !self.contains(position) {
            return None;
        }

        Some(self.linear_index(position))
    }

    /// Linear index without bounds checking.
    #[inline(always)]
    pub(crate) fn linear_index(&self, position: UVec3) -> usize {
        let size = self.0;
        position.x as usize
            + size.x as usize * (position.y as usize + size.y as usize * position.z as usize)
    }

    /// Returns the grid position of a linear index.
    ///
    /// # Panics
    /// - If the grid is empty.
    #[must_use]
    pub fn coords(&self, index: usize) -> UVec3 {
        let sx = self.0.x as usize;
        let sy = self.0.y as usize;

        UVec3::new(
            (index % sx) as u32,
            ((index / sx) % sy) as u32,
            (index / (sx * sy)) as u32,
        )
    }
}
