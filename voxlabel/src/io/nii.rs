//! NIfTI-1 volumes through the `nifti` crate.
//!
//! Voxels of any scalar data type are converted to [`Label`]s on read. Geometry comes
//! from the sform when present, then the qform, and falls back to `pixdim` alone.
//! Volumes are written as unsigned 16-bit data with an sform built from the geometry.

use std::path::Path;

use glam::{Mat3, Quat, Vec3};
use log::debug;
use ndarray::{Array3, Axis, Ix3, ShapeBuilder};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions, writer::WriterOptions};

use crate::{Dimensions, Geometry, Label, VoxelGrid};

use super::{LoadError, WriteError};

/// NIfTI `xyzt_units` value for millimetres.
const UNITS_MM: u8 = 2;
/// NIfTI transform code for scanner-anatomical coordinates.
const XFORM_SCANNER_ANAT: i16 = 1;

pub fn import_grid_from_nifti<P: AsRef<Path>>(path: P) -> Result<VoxelGrid, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::Open {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }

    let object = ReaderOptions::new().read_file(path)?;
    let header = object.header().clone();
    let volume = object.into_volume().into_ndarray::<Label>()?;

    let shape = volume.shape().to_vec();
    let volume = match shape.as_slice() {
        [_, _, _] => volume.into_dimensionality::<Ix3>(),
        [_, _, _, 1] => volume.index_axis_move(Axis(3), 0).into_dimensionality::<Ix3>(),
        _ => return Err(LoadError::NotVolumetric(shape.clone())),
    }
    .map_err(|_| LoadError::NotVolumetric(shape.clone()))?;

    let dims = Dimensions::new(shape[0] as u32, shape[1] as u32, shape[2] as u32);
    let geometry = geometry_from_header(&header, dims);

    // The transposed view iterates x fastest, matching the grid layout.
    let voxels: Vec<Label> = volume.t().iter().copied().collect();

    debug!(
        "Read NIfTI volume {dims} (datatype {}, sform {}, qform {})",
        header.datatype, header.sform_code, header.qform_code
    );

    Ok(VoxelGrid::from_voxels(geometry, voxels)?)
}

pub fn export_grid_to_nifti<P: AsRef<Path>>(path: P, grid: &VoxelGrid) -> Result<u64, WriteError> {
    let path = path.as_ref();
    let size = grid.dims().size();
    let header = header_from_geometry(grid.geometry());

    let volume = Array3::from_shape_vec(
        (size.x as usize, size.y as usize, size.z as usize).f(),
        grid.voxels().to_vec(),
    )?;

    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&volume)?;

    Ok(std::fs::metadata(path)?.len())
}

fn geometry_from_header(header: &NiftiHeader, dims: Dimensions) -> Geometry {
    let pixdim = Vec3::new(header.pixdim[1], header.pixdim[2], header.pixdim[3]);
    let spacing = positive_or_one(pixdim.abs());

    if header.sform_code > 0 {
        let columns =
            [0usize, 1, 2].map(|j| Vec3::new(header.srow_x[j], header.srow_y[j], header.srow_z[j]));
        let spacing = positive_or_one(Vec3::new(
            columns[0].length(),
            columns[1].length(),
            columns[2].length(),
        ));
        let direction = Mat3::from_cols(
            columns[0] / spacing.x,
            columns[1] / spacing.y,
            columns[2] / spacing.z,
        );
        let origin = Vec3::new(header.srow_x[3], header.srow_y[3], header.srow_z[3]);

        return Geometry::new(dims)
            .with_spacing(spacing)
            .with_origin(origin)
            .with_direction(direction);
    }

    if header.qform_code > 0 {
        let (b, c, d) = (header.quatern_b, header.quatern_c, header.quatern_d);
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };

        let rotation = Mat3::from_quat(Quat::from_xyzw(b, c, d, a));
        let direction = Mat3::from_cols(rotation.x_axis, rotation.y_axis, rotation.z_axis * qfac);
        let origin = Vec3::new(header.quatern_x, header.quatern_y, header.quatern_z);

        return Geometry::new(dims)
            .with_spacing(spacing)
            .with_origin(origin)
            .with_direction(direction);
    }

    Geometry::new(dims).with_spacing(spacing)
}

fn header_from_geometry(geometry: &Geometry) -> NiftiHeader {
    let spacing = geometry.spacing;
    let affine = Mat3::from_cols(
        geometry.direction.x_axis * spacing.x,
        geometry.direction.y_axis * spacing.y,
        geometry.direction.z_axis * spacing.z,
    );
    let origin = geometry.origin;

    NiftiHeader {
        pixdim: [1.0, spacing.x, spacing.y, spacing.z, 1.0, 1.0, 1.0, 1.0],
        sform_code: XFORM_SCANNER_ANAT,
        qform_code: 0,
        srow_x: [affine.x_axis.x, affine.y_axis.x, affine.z_axis.x, origin.x],
        srow_y: [affine.x_axis.y, affine.y_axis.y, affine.z_axis.y, origin.y],
        srow_z: [affine.x_axis.z, affine.y_axis.z, affine.z_axis.z, origin.z],
        xyzt_units: UNITS_MM,
        ..NiftiHeader::default()
    }
}

fn positive_or_one(v: Vec3) -> Vec3 {
    Vec3::select(v.cmpgt(Vec3::ZERO), v, Vec3::ONE)
}
