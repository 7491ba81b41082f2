//! Module `label_map::merge`
//!
//! Consolidates several [`LabelMap`]s of the same geometry into one. How colliding labels
//! are resolved is chosen with a [`MergePolicy`]. Every merge also returns a
//! [`Provenance`] that remembers which source label each merged label came from.
//!
//! # Examples
//!
//! ```rust
//! use voxlabel::{Dimensions, Geometry, LabelMap, MergePolicy, VoxelGrid, merge};
//!
//! let geometry = Geometry::new(Dimensions::new(4, 1, 1));
//! let grid = VoxelGrid::from_voxels(geometry, vec![5, 0, 8, 8]).unwrap();
//! let map = LabelMap::from_grid(&grid);
//!
//! let merged = merge(map.select_all(&[8, 5]), MergePolicy::Pack).unwrap();
//!
//! assert_eq!(merged.map.labels().collect::<Vec<_>>(), vec![1, 2]);
//! assert_eq!(merged.provenance.source(1), Some(8));
//! assert_eq!(merged.provenance.source(2), Some(5));
//! ```

use std::collections::BTreeMap;

use log::debug;

use crate::{Label, LabelMap, LabelMapError, LabelObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergePolicy {
    /// Keep labels; colliding objects are pushed afterwards under fresh labels.
    Keep,
    /// Fuse objects that share a label into one object.
    Aggregate,
    /// Relabel every object consecutively from 1, in input order.
    #[default]
    Pack,
    /// Keep labels; any collision is an error.
    Strict,
}

impl std::fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MergePolicy::Keep => "keep",
            MergePolicy::Aggregate => "aggregate",
            MergePolicy::Pack => "pack",
            MergePolicy::Strict => "strict",
        };

        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MergeError {
    #[error("nothing to merge")]
    NoInputs,

    #[error("label map #{index} does not share the geometry of the first input")]
    GeometryMismatch { index: usize },

    #[error("label {0} is present in more than one input")]
    LabelCollision(Label),

    #[error(transparent)]
    LabelMap(#[from] LabelMapError),
}

/// Merged label to source label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    sources: BTreeMap<Label, Label>,
}

impl Provenance {
    /// Records that `merged` was produced from an object labelled `source`.
    pub fn record(&mut self, merged: Label, source: Label) {
        self.sources.insert(merged, source);
    }

    #[must_use]
    pub fn source(&self, merged: Label) -> Option<Label> {
        self.sources.get(&merged).copied()
    }

    /// `(merged, source)` pairs in ascending merged-label order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, Label)> + '_ {
        self.sources.iter().map(|(&merged, &source)| (merged, source))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub map: LabelMap,
    pub provenance: Provenance,
}

/// Merges `maps` into a single map according to `policy`.
///
/// Inputs are consumed in order; objects of one input are visited in ascending label
/// order.
///
/// # Errors
/// - [`MergeError::NoInputs`] if `maps` is empty.
/// - [`MergeError::GeometryMismatch`] if an input differs in geometry from the first.
/// - [`MergeError::LabelCollision`] for [`MergePolicy::Strict`] when a label repeats.
/// - [`MergeError::LabelMap`] when [`MergePolicy::Pack`] or [`MergePolicy::Keep`] run
///   out of labels.
pub fn merge(maps: Vec<LabelMap>, policy: MergePolicy) -> Result<Merged, MergeError> {
    let geometry = *maps.first().ok_or(MergeError::NoInputs)?.geometry();

    if let Some(index) = maps.iter().position(|map| map.geometry() != &geometry) {
        return Err(MergeError::GeometryMismatch { index });
    }

    let inputs = maps.len();
    let objects = maps
        .into_iter()
        .flat_map(|map| map.objects.into_values());

    let mut merged = Merged {
        map: LabelMap::empty(geometry),
        provenance: Provenance::default(),
    };

    match policy {
        MergePolicy::Pack => merge_with_pack(&mut merged, objects)?,
        MergePolicy::Keep => merge_with_keep(&mut merged, objects)?,
        MergePolicy::Strict => merge_with_strict(&mut merged, objects)?,
        MergePolicy::Aggregate => merge_with_aggregate(&mut merged, objects),
    }

    debug!(
        "Merged {inputs} label maps into {} objects ({policy})",
        merged.map.len()
    );

    Ok(merged)
}

fn merge_with_pack(
    merged: &mut Merged,
    objects: impl Iterator<Item = LabelObject>,
) -> Result<(), MergeError> {
    for object in objects {
        let source = object.label();
        let label = merged.map.push(object)?;
        merged.provenance.record(label, source);
    }

    Ok(())
}

fn merge_with_keep(
    merged: &mut Merged,
    objects: impl Iterator<Item = LabelObject>,
) -> Result<(), MergeError> {
    let mut deferred = Vec::new();

    for object in objects {
        if merged.map.contains_label(object.label()) {
            deferred.push(object);
            continue;
        }

        let source = object.label();
        merged.map.insert(object)?;
        merged.provenance.record(source, source);
    }

    for object in deferred {
        let source = object.label();
        let label = merged.map.push(object)?;
        merged.provenance.record(label, source);
    }

    Ok(())
}

fn merge_with_strict(
    merged: &mut Merged,
    objects: impl Iterator<Item = LabelObject>,
) -> Result<(), MergeError> {
    for object in objects {
        let label = object.label();
        if merged.map.contains_label(label) {
            return Err(MergeError::LabelCollision(label));
        }

        merged.map.insert(object)?;
        merged.provenance.record(label, label);
    }

    Ok(())
}

fn merge_with_aggregate(merged: &mut Merged, objects: impl Iterator<Item = LabelObject>) {
    let geometry = *merged.map.geometry();

    for object in objects {
        let label = object.label();
        let object = match merged.map.objects.remove(&label) {
            Some(existing) => existing.fuse(object, &geometry),
            None => object,
        };

        merged.map.objects.insert(label, object);
        merged.provenance.record(label, label);
    }
}
