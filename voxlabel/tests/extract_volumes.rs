use glam::{Mat3, UVec3, Vec3};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use tempfile::tempdir;
use voxlabel::{
    BACKGROUND, Dimensions, Extraction, Geometry, Label, LoadError, VoxelGrid, WriteError,
    read_volume, write_volume,
};

fn geometry(x: u32, y: u32, z: u32) -> Geometry {
    Geometry::new(Dimensions::new(x, y, z))
        .with_spacing(Vec3::new(0.75, 0.75, 1.5))
        .with_origin(Vec3::new(-90.0, 126.0, -72.0))
        .with_direction(Mat3::from_cols(Vec3::NEG_X, Vec3::NEG_Y, Vec3::Z))
}

/// Blocky random volume: labels are painted in small boxes so runs are longer than one.
fn random_volume(seed: u64, labels: Label) -> VoxelGrid {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut grid = VoxelGrid::new(geometry(24, 20, 12));
    let size = grid.dims().size();

    for _ in 0..40 {
        let label = rng.random_range(0..=labels);
        let min = UVec3::new(
            rng.random_range(0..size.x),
            rng.random_range(0..size.y),
            rng.random_range(0..size.z),
        );
        let extent = UVec3::new(
            rng.random_range(1..8),
            rng.random_range(1..6),
            rng.random_range(1..4),
        );
        let max = (min + extent).min(size);

        for z in min.z..max.z {
            for y in min.y..max.y {
                for x in min.x..max.x {
                    grid.set(UVec3::new(x, y, z), label).unwrap();
                }
            }
        }
    }

    grid
}

/// Volume with three regions labelled 1, 2 and 3.
fn three_regions() -> VoxelGrid {
    let mut grid = VoxelGrid::new(geometry(6, 4, 3));
    for z in 0..3 {
        for y in 0..4 {
            for x in 0..6 {
                let label = match (x, z) {
                    (0..2, _) => 1,
                    (2..4, 0..2) => 2,
                    (4..6, 1..3) => 3,
                    _ => BACKGROUND,
                };
                grid.set(UVec3::new(x, y, z), label).unwrap();
            }
        }
    }
    grid
}

fn values(grid: &VoxelGrid) -> Vec<Label> {
    let mut values = grid.voxels().to_vec();
    values.sort_unstable();
    values.dedup();
    values
}

#[test]
fn test_scenario_three_regions() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("regions.vlm");
    let output = dir.path().join("extracted.vlm");

    let source = three_regions();
    write_volume(&input, &source).unwrap();

    let grid = read_volume(&input).unwrap();
    let extracted = Extraction::new(vec![1, 3], 9).unwrap().run(grid).unwrap();
    write_volume(&output, &extracted.grid).unwrap();

    let result = read_volume(&output).unwrap();
    assert_eq!(values(&result), vec![0, 9]);
    assert_eq!(result.geometry(), source.geometry());

    for (before, after) in source.voxels().iter().zip(result.voxels()) {
        match before {
            1 | 3 => assert_eq!(*after, 9),
            _ => assert_eq!(*after, BACKGROUND),
        }
    }
}

#[test]
fn test_scenario_three_regions_keep_unselected() {
    let source = three_regions();
    let extraction = Extraction::new(vec![1, 3], 9)
        .unwrap()
        .keep_unselected(true);
    let result = extraction.run(source.clone()).unwrap().grid;

    assert_eq!(values(&result), vec![0, 2, 9]);
    for (before, after) in source.voxels().iter().zip(result.voxels()) {
        match before {
            1 | 3 => assert_eq!(*after, 9),
            other => assert_eq!(after, other),
        }
    }
}

#[test]
fn test_absent_label_gives_background() {
    let mut source = VoxelGrid::new(geometry(4, 4, 4));
    source.set(UVec3::new(1, 1, 1), 1).unwrap();
    source.set(UVec3::new(2, 2, 2), 2).unwrap();

    let extracted = Extraction::new(vec![99], 1).unwrap().run(source).unwrap();

    assert!(extracted.grid.voxels().iter().all(|&v| v == BACKGROUND));
    assert_eq!(extracted.report.missing().collect::<Vec<_>>(), vec![99]);
}

#[test]
fn test_random_volumes_relabel_requested_regions() {
    for seed in 0..8 {
        let source = random_volume(seed, 6);
        let requested: Vec<Label> = vec![2, 5, 6];

        let result = Extraction::new(requested.clone(), 42)
            .unwrap()
            .run(source.clone())
            .unwrap();

        for (before, after) in source.voxels().iter().zip(result.grid.voxels()) {
            if requested.contains(before) {
                assert_eq!(*after, 42);
            } else {
                assert_eq!(*after, BACKGROUND);
            }
        }

        let expected: usize = requested.iter().map(|&l| source.count(l)).sum();
        assert_eq!(result.report.relabelled, expected);
    }
}

#[test]
fn test_order_independence() {
    let source = random_volume(11, 4);

    let a = Extraction::new(vec![3, 1], 7).unwrap().run(source.clone()).unwrap();
    let b = Extraction::new(vec![1, 3], 7).unwrap().run(source).unwrap();

    assert_eq!(a.grid, b.grid);
}

#[test]
fn test_idempotent_output_bytes() {
    let dir = tempdir().unwrap();
    let source = random_volume(5, 5);
    let extraction = Extraction::new(vec![1, 4], 3).unwrap();

    let first = dir.path().join("first.vlm");
    let second = dir.path().join("second.vlm");
    write_volume(&first, &extraction.run(source.clone()).unwrap().grid).unwrap();
    write_volume(&second, &extraction.run(source).unwrap().grid).unwrap();

    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[test]
fn test_rerun_on_output_label_selects_union() {
    let source = random_volume(23, 6);
    let requested = vec![1, 2, 4];

    let first = Extraction::new(requested.clone(), 9)
        .unwrap()
        .run(source.clone())
        .unwrap()
        .grid;
    let second = Extraction::new(vec![9], 9)
        .unwrap()
        .run(first.clone())
        .unwrap()
        .grid;

    assert_eq!(first, second);
    for (before, after) in source.voxels().iter().zip(second.voxels()) {
        assert_eq!(requested.contains(before), *after == 9);
    }
}

#[test]
fn test_nifti_roundtrip() {
    let dir = tempdir().unwrap();
    let source = random_volume(3, 9);

    for name in ["volume.nii", "volume.nii.gz"] {
        let path = dir.path().join(name);
        write_volume(&path, &source).unwrap();

        let back = read_volume(&path).unwrap();
        assert_eq!(back.voxels(), source.voxels());
        assert_eq!(back.geometry(), source.geometry());
    }
}

#[test]
fn test_nifti_to_vlm_pipeline() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("regions.nii.gz");
    let output = dir.path().join("regions.vlm");

    write_volume(&input, &three_regions()).unwrap();
    let extracted = Extraction::new(vec![2], 1)
        .unwrap()
        .run(read_volume(&input).unwrap())
        .unwrap();
    write_volume(&output, &extracted.grid).unwrap();

    let result = read_volume(&output).unwrap();
    assert_eq!(result.count(1), three_regions().count(2));
    assert_eq!(values(&result), vec![0, 1]);
}

#[test]
fn test_unsupported_extensions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("volume.mha");

    assert!(matches!(
        write_volume(&path, &three_regions()),
        Err(WriteError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        read_volume(&path),
        Err(LoadError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_unwritable_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("volume.vlm");

    assert!(matches!(
        write_volume(&path, &three_regions()),
        Err(WriteError::Create { .. })
    ));
}

#[test]
fn test_corrupt_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.vlm");
    std::fs::write(&path, b"definitely not a label volume").unwrap();

    assert!(matches!(read_volume(&path), Err(LoadError::BadMagic)));
}
