//! Module `relabel`
//!
//! A [`ChangeMap`] describes value substitutions applied to every voxel of a grid by
//! [`VoxelGrid::relabel`](crate::VoxelGrid::relabel). Values without an entry pass
//! through unchanged, background included.
//!
//! # Examples
//!
//! ```rust
//! use voxlabel::ChangeMap;
//!
//! let changes = ChangeMap::uniform([1, 3], 9);
//! assert_eq!(changes.apply(1), 9);
//! assert_eq!(changes.apply(2), 2);
//! assert_eq!(changes.apply(3), 9);
//! ```

use rustc_hash::FxHashMap;

use crate::{Label, Provenance};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeMap {
    changes: FxHashMap<Label, Label>,
}

impl ChangeMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps every label in `from` to the single label `to`.
    #[must_use]
    pub fn uniform<I: IntoIterator<Item = Label>>(from: I, to: Label) -> Self {
        let mut changes = Self::new();
        for label in from {
            changes.insert(label, to);
        }
        changes
    }

    /// Registers `from -> to`, replacing any earlier change for `from`.
    pub fn insert(&mut self, from: Label, to: Label) {
        self.changes.insert(from, to);
    }

    #[must_use]
    #[inline(always)]
    pub fn get(&self, from: Label) -> Option<Label> {
        self.changes.get(&from).copied()
    }

    #[must_use]
    #[inline(always)]
    pub fn apply(&self, label: Label) -> Label {
        self.get(label).unwrap_or(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Re-keys the change map on merged labels.
    ///
    /// A merge may hand out new identifiers, so a change keyed on a source label is
    /// moved to every merged label that originated from it. Merged labels whose source
    /// has no change are left out and therefore pass through.
    #[must_use]
    pub fn through(&self, provenance: &Provenance) -> Self {
        let mut changes = Self::new();
        for (merged, source) in provenance.iter() {
            if let Some(to) = self.get(source) {
                changes.insert(merged, to);
            }
        }
        changes
    }

    /// Dense table indexed by voxel value, one entry per representable label.
    pub(crate) fn lookup_table(&self) -> Vec<Label> {
        let mut table: Vec<Label> = (0..=Label::MAX).collect();
        for (&from, &to) in self.changes.iter() {
            table[from as usize] = to;
        }
        table
    }
}
