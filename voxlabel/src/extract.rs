//! Module `extract`
//!
//! The label extraction pipeline: convert a dense grid into a
//! [`LabelMap`](crate::LabelMap), select the requested labels, merge the selections with
//! [`MergePolicy::Pack`], densify, and relabel every extracted voxel to one output label.
//!
//! Packing renumbers the selected objects, so the relabel step does not read requested
//! labels off the packed grid. The merge [`Provenance`](crate::Provenance) carries the
//! original label of every packed object and the change map is re-keyed through it.

use log::{debug, info, warn};

use crate::{BACKGROUND, ChangeMap, Label, MergeError, MergePolicy, VoxelGrid, merge};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("at least one label must be requested")]
    NoLabels,

    #[error("the background label (0) cannot be extracted")]
    BackgroundRequested,

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// What to extract and which label the extracted regions receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    labels: Vec<Label>,
    output_label: Label,
    keep_unselected: bool,
}

/// Voxel count found for one requested label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelMatch {
    pub label: Label,
    pub voxel_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// One entry per distinct requested label, in request order.
    pub matches: Vec<LabelMatch>,
    /// Voxels rewritten to the output label.
    pub relabelled: usize,
}

impl ExtractionReport {
    /// Requested labels that do not occur in the volume.
    pub fn missing(&self) -> impl Iterator<Item = Label> + '_ {
        self.matches
            .iter()
            .filter(|m| m.voxel_count == 0)
            .map(|m| m.label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub grid: VoxelGrid,
    pub report: ExtractionReport,
}

impl Extraction {
    /// # Errors
    /// - [`ExtractError::NoLabels`] if `labels` is empty.
    /// - [`ExtractError::BackgroundRequested`] if `labels` holds [`BACKGROUND`], which
    ///   is never part of a label object.
    pub fn new(labels: Vec<Label>, output_label: Label) -> Result<Self, ExtractError> {
        if labels.is_empty() {
            return Err(ExtractError::NoLabels);
        }
        if labels.contains(&BACKGROUND) {
            return Err(ExtractError::BackgroundRequested);
        }

        Ok(Self {
            labels,
            output_label,
            keep_unselected: false,
        })
    }

    /// When set, voxels whose label was not requested keep their value instead of
    /// turning into background.
    #[must_use]
    pub fn keep_unselected(mut self, keep: bool) -> Self {
        self.keep_unselected = keep;
        self
    }

    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    #[must_use]
    pub fn output_label(&self) -> Label {
        self.output_label
    }

    /// Runs the pipeline on `grid`.
    ///
    /// Requested labels absent from the grid select nothing and are reported with a
    /// zero voxel count.
    ///
    /// # Errors
    /// - [`ExtractError::Merge`] if the packed merge runs out of labels.
    pub fn run(&self, grid: VoxelGrid) -> Result<Extracted, ExtractError> {
        if self.output_label == BACKGROUND {
            warn!("Output label is the background value, extracted regions will be erased");
        }

        let source = self.keep_unselected.then(|| grid.clone());

        let map = grid.into_label_map();
        let selections = map.select_all(&self.labels);

        let matches: Vec<LabelMatch> = selections
            .iter()
            .zip(distinct(&self.labels))
            .map(|(selection, label)| LabelMatch {
                label,
                voxel_count: selection.objects().map(|o| o.voxel_count()).sum(),
            })
            .collect();

        for m in matches.iter() {
            if m.voxel_count == 0 {
                warn!("Label {} is not present in the volume", m.label);
            } else {
                debug!("Label {}: {} voxels", m.label, m.voxel_count);
            }
        }

        let merged = merge(selections, MergePolicy::Pack)?;
        let changes = ChangeMap::uniform(self.labels.iter().copied(), self.output_label)
            .through(&merged.provenance);

        let mut grid = merged.map.into_grid().relabel(&changes);

        if let Some(source) = source {
            restore_unselected(&mut grid, &source, &requested_mask(&self.labels));
        }

        let relabelled: usize = matches.iter().map(|m| m.voxel_count).sum();
        info!(
            "Extracted {relabelled} voxels from {} labels into label {}",
            matches.len(),
            self.output_label
        );

        Ok(Extracted {
            grid,
            report: ExtractionReport {
                matches,
                relabelled,
            },
        })
    }
}

fn distinct(labels: &[Label]) -> impl Iterator<Item = Label> + '_ {
    let mut seen = rustc_hash::FxHashSet::default();
    labels.iter().copied().filter(move |label| seen.insert(*label))
}

fn requested_mask(labels: &[Label]) -> Vec<bool> {
    let mut requested = vec![false; Label::MAX as usize + 1];
    for &label in labels {
        requested[label as usize] = true;
    }
    requested
}

fn restore_unselected(grid: &mut VoxelGrid, source: &VoxelGrid, requested: &[bool]) {
    for (voxel, &original) in grid.voxels_mut().iter_mut().zip(source.voxels()) {
        if !requested[original as usize] {
            *voxel = original;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dimensions, Geometry};

    fn grid(voxels: Vec<Label>) -> VoxelGrid {
        let geometry = Geometry::new(Dimensions::new(voxels.len() as u32, 1, 1));
        VoxelGrid::from_voxels(geometry, voxels).unwrap()
    }

    #[test]
    fn test_no_labels() {
        assert!(matches!(
            Extraction::new(Vec::new(), 1),
            Err(ExtractError::NoLabels)
        ));
    }

    #[test]
    fn test_background_label_rejected() {
        assert!(matches!(
            Extraction::new(vec![1, BACKGROUND], 9),
            Err(ExtractError::BackgroundRequested)
        ));
        assert!(matches!(
            Extraction::new(vec![BACKGROUND], 1),
            Err(ExtractError::BackgroundRequested)
        ));
    }

    #[test]
    fn test_extract_two_of_three() {
        let extraction = Extraction::new(vec![1, 3], 9).unwrap();
        let extracted = extraction.run(grid(vec![0, 1, 2, 3, 3, 2, 1])).unwrap();

        assert_eq!(extracted.grid.voxels(), &[0, 9, 0, 9, 9, 0, 9]);
        assert_eq!(extracted.report.relabelled, 4);
        assert_eq!(
            extracted.report.matches,
            vec![
                LabelMatch {
                    label: 1,
                    voxel_count: 2
                },
                LabelMatch {
                    label: 3,
                    voxel_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_packed_ids_never_leak() {
        // Packing turns label 3 into 2; label 2 is not requested.
        let extraction = Extraction::new(vec![1, 3], 9).unwrap();
        let extracted = extraction.run(grid(vec![1, 2, 3])).unwrap();

        assert_eq!(extracted.grid.voxels(), &[9, 0, 9]);
    }

    #[test]
    fn test_keep_unselected() {
        let extraction = Extraction::new(vec![1, 3], 9)
            .unwrap()
            .keep_unselected(true);
        let extracted = extraction.run(grid(vec![0, 1, 2, 3])).unwrap();

        assert_eq!(extracted.grid.voxels(), &[0, 9, 2, 9]);
    }

    #[test]
    fn test_absent_label_is_empty() {
        let extraction = Extraction::new(vec![99], 1).unwrap();
        let extracted = extraction.run(grid(vec![1, 2, 1, 0])).unwrap();

        assert_eq!(extracted.grid.voxels(), &[0, 0, 0, 0]);
        assert_eq!(extracted.report.missing().collect::<Vec<_>>(), vec![99]);
        assert_eq!(extracted.report.relabelled, 0);
    }

    #[test]
    fn test_duplicates_are_harmless() {
        let once = Extraction::new(vec![2], 5).unwrap();
        let twice = Extraction::new(vec![2, 2, 2], 5).unwrap();
        let source = grid(vec![2, 0, 2, 1]);

        let a = once.run(source.clone()).unwrap();
        let b = twice.run(source).unwrap();

        assert_eq!(a.grid, b.grid);
        assert_eq!(b.report.matches.len(), 1);
    }

    #[test]
    fn test_order_independent() {
        let source = grid(vec![3, 1, 0, 2, 1, 3]);
        let a = Extraction::new(vec![3, 1], 7).unwrap().run(source.clone()).unwrap();
        let b = Extraction::new(vec![1, 3], 7).unwrap().run(source).unwrap();

        assert_eq!(a.grid, b.grid);
    }

    #[test]
    fn test_output_label_background() {
        let extraction = Extraction::new(vec![1], BACKGROUND).unwrap();
        let extracted = extraction.run(grid(vec![1, 1, 2])).unwrap();
        assert_eq!(extracted.grid.voxels(), &[0, 0, 0]);
    }
}
