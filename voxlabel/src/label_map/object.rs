//! Module `label_map::object`
//!
//! A [`LabelObject`] stores every voxel of one label as a list of x-aligned [`Run`]s,
//! kept sorted in scan order (z, then y, then x) and never overlapping.

use std::cmp::Ordering;

use glam::{DVec3, UVec3, Vec3};

use crate::{Geometry, Label};

/// A horizontal line of `len` voxels starting at `start` and extending along +x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Run {
    pub start: UVec3,
    pub len: u32,
}

impl Run {
    #[must_use]
    #[inline(always)]
    pub const fn new(start: UVec3, len: u32) -> Self {
        Self { start, len }
    }

    /// Inclusive x coordinate of the last voxel, saturating at `u32::MAX`.
    ///
    /// An empty run reports its start.
    #[must_use]
    #[inline(always)]
    pub const fn end_x(&self) -> u32 {
        self.start.x.saturating_add(self.len.saturating_sub(1))
    }

    /// Exclusive x end, wide enough to never overflow.
    #[inline(always)]
    pub(crate) const fn end_exclusive(&self) -> u64 {
        self.start.x as u64 + self.len as u64
    }

    #[inline(always)]
    fn row_key(&self) -> (u32, u32) {
        (self.start.z, self.start.y)
    }

    #[inline(always)]
    fn scan_cmp(&self, other: &Self) -> Ordering {
        (self.start.z, self.start.y, self.start.x).cmp(&(other.start.z, other.start.y, other.start.x))
    }
}

/// Shape descriptors computed once when a [`LabelObject`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShapeAttributes {
    pub voxel_count: usize,
    /// Inclusive lower corner of the bounding box.
    pub bbox_min: UVec3,
    /// Inclusive upper corner of the bounding box.
    pub bbox_max: UVec3,
    /// Mean voxel position, in grid coordinates.
    pub centroid: Vec3,
    /// Voxel count scaled by the physical voxel volume.
    pub physical_size: f32,
}

impl ShapeAttributes {
    fn from_runs(runs: &[Run], geometry: &Geometry) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut voxel_count = 0usize;
        let mut bbox_min = UVec3::MAX;
        let mut bbox_max = UVec3::ZERO;
        let mut sum = DVec3::ZERO;

        for run in runs {
            let n = run.len as f64;
            voxel_count += run.len as usize;

            bbox_min = bbox_min.min(run.start);
            bbox_max = bbox_max.max(UVec3::new(run.end_x(), run.start.y, run.start.z));

            // Sum of x over the run is n * x0 + n * (n - 1) / 2.
            sum.x += n * run.start.x as f64 + n * (n - 1.0) / 2.0;
            sum.y += n * run.start.y as f64;
            sum.z += n * run.start.z as f64;
        }

        let centroid = (sum / voxel_count as f64).as_vec3();
        let physical_size = (voxel_count as f64 * geometry.voxel_volume() as f64) as f32;

        Self {
            voxel_count,
            bbox_min,
            bbox_max,
            centroid,
            physical_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelObject {
    label: Label,
    runs: Vec<Run>,
    shape: ShapeAttributes,
}

impl LabelObject {
    /// Builds an object from arbitrary runs.
    ///
    /// Runs are sorted into scan order and overlapping or touching runs of the same row
    /// are coalesced, so the object never counts a voxel twice. Zero-length runs are
    /// dropped.
    #[must_use]
    pub fn new(label: Label, runs: Vec<Run>, geometry: &Geometry) -> Self {
        let runs = normalize_runs(runs);
        let shape = ShapeAttributes::from_runs(&runs, geometry);

        Self { label, runs, shape }
    }

    /// Builds an object from runs already in scan order and disjoint.
    pub(crate) fn from_sorted_runs(label: Label, runs: Vec<Run>, geometry: &Geometry) -> Self {
        debug_assert!(runs.windows(2).all(|w| w[0].scan_cmp(&w[1]).is_lt()));
        let shape = ShapeAttributes::from_runs(&runs, geometry);

        Self { label, runs, shape }
    }

    #[must_use]
    #[inline(always)]
    pub fn label(&self) -> Label {
        self.label
    }

    #[must_use]
    #[inline(always)]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    #[must_use]
    #[inline(always)]
    pub fn shape(&self) -> &ShapeAttributes {
        &self.shape
    }

    #[must_use]
    #[inline(always)]
    pub fn voxel_count(&self) -> usize {
        self.shape.voxel_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Same voxels, different label.
    #[must_use]
    pub fn with_label(&self, label: Label) -> Self {
        Self {
            label,
            runs: self.runs.clone(),
            shape: self.shape,
        }
    }

    pub(crate) fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    /// Every voxel position of the object, in scan order.
    pub fn voxels(&self) -> impl Iterator<Item = UVec3> + '_ {
        self.runs
            .iter()
            .flat_map(|run| {
                (run.start.x..=run.end_x())
                    .take(run.len as usize)
                    .map(move |x| UVec3::new(x, run.start.y, run.start.z))
            })
    }

    #[must_use]
    pub fn contains(&self, position: UVec3) -> bool {
        let probe = Run::new(position, 1);

        match self.runs.binary_search_by(|run| run.scan_cmp(&probe)) {
            Ok(_) => true,
            Err(0) => false,
            Err(i) => {
                let run = &self.runs[i - 1];
                run.row_key() == probe.row_key() && position.x <= run.end_x()
            }
        }
    }

    /// Unites the voxels of `other` into `self`, keeping `self`'s label.
    #[must_use]
    pub fn fuse(self, other: Self, geometry: &Geometry) -> Self {
        let mut runs = self.runs;
        runs.extend(other.runs);

        Self::new(self.label, runs, geometry)
    }
}

fn normalize_runs(mut runs: Vec<Run>) -> Vec<Run> {
    runs.retain(|run| run.len > 0);
    runs.sort_unstable_by(Run::scan_cmp);

    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last)
                if last.row_key() == run.row_key() && run.start.x as u64 <= last.end_exclusive() =>
            {
                let end = last.end_exclusive().max(run.end_exclusive());
                last.len = u32::try_from(end - last.start.x as u64).unwrap_or(u32::MAX);
            }
            _ => merged.push(run),
        }
    }

    merged
}
