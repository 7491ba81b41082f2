//! Module `label_map`
//!
//! Sparse representation of a segmentation volume. A [`LabelMap`] holds one
//! [`LabelObject`] per label, each a set of run-length encoded lines. Objects of one map
//! never overlap, and together with the background they cover the grid exactly once.
//!
//! # Examples
//!
//! ```rust
//! use voxlabel::{Dimensions, Geometry, LabelMap, VoxelGrid};
//!
//! let geometry = Geometry::new(Dimensions::new(5, 1, 1));
//! let grid = VoxelGrid::from_voxels(geometry, vec![0, 2, 2, 0, 7]).unwrap();
//!
//! let map = LabelMap::from_grid(&grid);
//! assert_eq!(map.labels().collect::<Vec<_>>(), vec![2, 7]);
//!
//! let only_two = map.select(2);
//! assert_eq!(only_two.into_grid().voxels(), &[0, 2, 2, 0, 0]);
//! ```

pub mod merge;
mod object;

use std::collections::BTreeMap;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{BACKGROUND, Geometry, Label, VoxelGrid};

pub use object::{LabelObject, Run, ShapeAttributes};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum LabelMapError {
    #[error("label {0} is already present in the label map")]
    DuplicateLabel(Label),

    #[error("the background label cannot be assigned to an object")]
    BackgroundLabel,

    #[error("every label value is already in use")]
    LabelsExhausted,

    #[error("object with label {0} extends outside of the grid")]
    OutOfBounds(Label),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    geometry: Geometry,
    objects: BTreeMap<Label, LabelObject>,
}

impl LabelMap {
    /// Creates a map without objects; densifies to an all-background grid.
    #[must_use]
    pub fn empty(geometry: Geometry) -> Self {
        Self {
            geometry,
            objects: BTreeMap::new(),
        }
    }

    /// Partitions the non-background voxels of `grid` by label.
    ///
    /// Each row is scanned once; consecutive voxels of equal label become one [`Run`].
    #[must_use]
    pub fn from_grid(grid: &VoxelGrid) -> Self {
        let geometry = *grid.geometry();
        let size = geometry.dims.size();
        let voxels = grid.voxels();
        let row_len = size.x as usize;

        let mut runs: FxHashMap<Label, Vec<Run>> = FxHashMap::default();

        if row_len > 0 {
            for (row_index, row) in voxels.chunks_exact(row_len).enumerate() {
                let y = (row_index % size.y as usize) as u32;
                let z = (row_index / size.y as usize) as u32;

                let mut x = 0;
                while x < row_len {
                    let label = row[x];
                    let start = x;
                    while x < row_len && row[x] == label {
                        x += 1;
                    }

                    if label != BACKGROUND {
                        runs.entry(label).or_default().push(Run::new(
                            glam::UVec3::new(start as u32, y, z),
                            (x - start) as u32,
                        ));
                    }
                }
            }
        }

        let objects: BTreeMap<Label, LabelObject> = runs
            .into_iter()
            .map(|(label, runs)| {
                (
                    label,
                    LabelObject::from_sorted_runs(label, runs, &geometry),
                )
            })
            .collect();

        debug!(
            "Converted {} grid into {} label objects",
            geometry.dims,
            objects.len()
        );

        Self { geometry, objects }
    }

    #[must_use]
    #[inline(always)]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    #[inline(always)]
    pub fn background(&self) -> Label {
        BACKGROUND
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Labels of all objects, ascending.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.objects.keys().copied()
    }

    /// Objects in ascending label order.
    pub fn objects(&self) -> impl Iterator<Item = &LabelObject> {
        self.objects.values()
    }

    #[must_use]
    pub fn object(&self, label: Label) -> Option<&LabelObject> {
        self.objects.get(&label)
    }

    #[must_use]
    pub fn contains_label(&self, label: Label) -> bool {
        self.objects.contains_key(&label)
    }

    /// Adds `object` under its own label.
    ///
    /// # Errors
    /// - [`LabelMapError::BackgroundLabel`] if the object carries the background label.
    /// - [`LabelMapError::DuplicateLabel`] if the label is already taken.
    /// - [`LabelMapError::OutOfBounds`] if any run leaves the grid.
    pub fn insert(&mut self, object: LabelObject) -> Result<(), LabelMapError> {
        let label = object.label();
        if label == BACKGROUND {
            return Err(LabelMapError::BackgroundLabel);
        }
        if self.objects.contains_key(&label) {
            return Err(LabelMapError::DuplicateLabel(label));
        }
        self.check_bounds(&object)?;

        self.objects.insert(label, object);

        Ok(())
    }

    /// Adds `object` under the next free label and returns that label.
    ///
    /// The next free label is the one after the current maximum; once the maximum is
    /// [`Label::MAX`] the lowest unused label above background is taken instead.
    ///
    /// # Errors
    /// - [`LabelMapError::LabelsExhausted`] if every non-background label is in use.
    /// - [`LabelMapError::OutOfBounds`] if any run leaves the grid.
    pub fn push(&mut self, mut object: LabelObject) -> Result<Label, LabelMapError> {
        let label = self.next_free_label()?;
        self.check_bounds(&object)?;

        object.set_label(label);
        self.objects.insert(label, object);

        Ok(label)
    }

    /// Removes and returns the object carrying `label`.
    pub fn remove(&mut self, label: Label) -> Option<LabelObject> {
        self.objects.remove(&label)
    }

    /// New map holding only the object carrying `label`.
    ///
    /// A label that is absent yields an empty map.
    #[must_use]
    pub fn select(&self, label: Label) -> Self {
        let mut selected = Self::empty(self.geometry);
        if let Some(object) = self.objects.get(&label) {
            selected.objects.insert(label, object.clone());
        }
        selected
    }

    /// One selection per distinct requested label, in request order.
    ///
    /// Repeated labels are selected once, at their first occurrence, so the
    /// selections never share voxels.
    #[must_use]
    pub fn select_all(&self, labels: &[Label]) -> Vec<Self> {
        let mut seen = FxHashSet::default();

        labels
            .iter()
            .copied()
            .filter(|label| seen.insert(*label))
            .map(|label| self.select(label))
            .collect()
    }

    /// Paints every object into a dense grid of the map's geometry.
    #[must_use]
    pub fn into_grid(self) -> VoxelGrid {
        let dims = self.geometry.dims;
        let mut grid = VoxelGrid::new(self.geometry);
        let voxels = grid.voxels_mut();

        for (label, object) in self.objects {
            for run in object.runs() {
                let start = dims.linear_index(run.start);
                voxels[start..start + run.len as usize].fill(label);
            }
        }

        grid
    }

    fn next_free_label(&self) -> Result<Label, LabelMapError> {
        match self.objects.last_key_value() {
            None => Ok(BACKGROUND + 1),
            Some((&last, _)) if last < Label::MAX => Ok(last + 1),
            Some(_) => (BACKGROUND + 1..=Label::MAX)
                .find(|label| !self.objects.contains_key(label))
                .ok_or(LabelMapError::LabelsExhausted),
        }
    }

    fn check_bounds(&self, object: &LabelObject) -> Result<(), LabelMapError> {
        let size = self.geometry.dims.size();
        let inside = object.runs().iter().all(|run| {
            run.start.y < size.y && run.start.z < size.z && run.end_exclusive() <= size.x as u64
        });

        if inside {
            Ok(())
        } else {
            Err(LabelMapError::OutOfBounds(object.label()))
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec3;

    use super::*;
    use crate::Dimensions;

    fn grid(dims: Dimensions, voxels: Vec<Label>) -> VoxelGrid {
        VoxelGrid::from_voxels(Geometry::new(dims), voxels).unwrap()
    }

    fn sample() -> VoxelGrid {
        #[rustfmt::skip]
        let voxels = vec![
            // z = 0
            1, 1, 0,
            2, 2, 2,
            // z = 1
            0, 3, 3,
            1, 0, 2,
        ];
        grid(Dimensions::new(3, 2, 2), voxels)
    }

    #[test]
    fn test_from_grid_partitions_voxels() {
        let source = sample();
        let map = LabelMap::from_grid(&source);

        assert_eq!(map.labels().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(map.object(1).unwrap().voxel_count(), 3);
        assert_eq!(map.object(2).unwrap().voxel_count(), 4);
        assert_eq!(map.object(3).unwrap().voxel_count(), 2);

        let total: usize = map.objects().map(LabelObject::voxel_count).sum();
        assert_eq!(total + source.count(BACKGROUND), source.dims().len());
    }

    #[test]
    fn test_from_grid_runs() {
        let map = LabelMap::from_grid(&sample());
        assert_eq!(
            map.object(2).unwrap().runs(),
            &[
                Run::new(UVec3::new(0, 1, 0), 3),
                Run::new(UVec3::new(2, 1, 1), 1)
            ]
        );
    }

    #[test]
    fn test_roundtrip_through_grid() {
        let source = sample();
        let map = source.clone().into_label_map();
        assert_eq!(map.into_grid(), source);
    }

    #[test]
    fn test_from_grid_all_background() {
        let map = LabelMap::from_grid(&grid(Dimensions::new(4, 4, 4), vec![0; 64]));
        assert!(map.is_empty());
    }

    #[test]
    fn test_from_grid_empty_dims() {
        let map = LabelMap::from_grid(&grid(Dimensions::new(0, 4, 4), Vec::new()));
        assert!(map.is_empty());
    }

    #[test]
    fn test_select() {
        let map = LabelMap::from_grid(&sample());

        let selected = map.select(3);
        assert_eq!(selected.labels().collect::<Vec<_>>(), vec![3]);
        assert_eq!(selected.geometry(), map.geometry());

        assert!(map.select(99).is_empty());
    }

    #[test]
    fn test_select_all_drops_duplicates() {
        let map = LabelMap::from_grid(&sample());
        let selections = map.select_all(&[3, 1, 3, 42]);

        assert_eq!(selections.len(), 3);
        assert_eq!(selections[0].labels().collect::<Vec<_>>(), vec![3]);
        assert_eq!(selections[1].labels().collect::<Vec<_>>(), vec![1]);
        assert!(selections[2].is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicates_and_background() {
        let geometry = Geometry::new(Dimensions::new(4, 1, 1));
        let mut map = LabelMap::empty(geometry);

        let object = LabelObject::new(5, vec![Run::new(UVec3::ZERO, 2)], &geometry);
        map.insert(object.clone()).unwrap();

        assert_eq!(
            map.insert(object.clone()),
            Err(LabelMapError::DuplicateLabel(5))
        );
        assert_eq!(
            map.insert(object.with_label(BACKGROUND)),
            Err(LabelMapError::BackgroundLabel)
        );
    }

    #[test]
    fn test_insert_rejects_out_of_bounds() {
        let geometry = Geometry::new(Dimensions::new(4, 1, 1));
        let mut map = LabelMap::empty(geometry);

        let object = LabelObject::new(1, vec![Run::new(UVec3::new(2, 0, 0), 3)], &geometry);
        assert_eq!(map.insert(object), Err(LabelMapError::OutOfBounds(1)));
    }

    #[test]
    fn test_insert_rejects_runs_past_the_axis_end() {
        let geometry = Geometry::new(Dimensions::new(4, 1, 1));
        let mut map = LabelMap::empty(geometry);

        let run = Run::new(UVec3::new(u32::MAX - 1, 0, 0), 5);
        let object = LabelObject::new(2, vec![run], &geometry);
        assert_eq!(map.insert(object), Err(LabelMapError::OutOfBounds(2)));
    }

    #[test]
    fn test_push_assigns_consecutive_labels() {
        let geometry = Geometry::new(Dimensions::new(4, 1, 1));
        let mut map = LabelMap::empty(geometry);

        let a = LabelObject::new(40, vec![Run::new(UVec3::ZERO, 1)], &geometry);
        let b = LabelObject::new(7, vec![Run::new(UVec3::new(2, 0, 0), 1)], &geometry);

        assert_eq!(map.push(a), Ok(1));
        assert_eq!(map.push(b), Ok(2));
        assert_eq!(map.object(2).unwrap().label(), 2);
    }

    #[test]
    fn test_push_fills_holes_after_max() {
        let geometry = Geometry::new(Dimensions::new(4, 1, 1));
        let mut map = LabelMap::empty(geometry);

        let object = LabelObject::new(1, vec![Run::new(UVec3::ZERO, 1)], &geometry);
        map.insert(object.with_label(1)).unwrap();
        map.insert(object.with_label(Label::MAX)).unwrap();

        assert_eq!(map.push(object), Ok(2));
    }

    #[test]
    fn test_into_grid_of_empty_map() {
        let geometry = Geometry::new(Dimensions::new(2, 2, 2));
        let grid = LabelMap::empty(geometry).into_grid();
        assert_eq!(grid.voxels(), &[0; 8]);
        assert_eq!(grid.geometry(), &geometry);
    }
}
