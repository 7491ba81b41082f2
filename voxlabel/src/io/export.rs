use std::{io::Write, path::Path};

use byteorder::{BigEndian, WriteBytesExt};
use glam::Vec3;
use log::debug;
use md5::{Digest, Md5};

use crate::{Label, VoxelGrid};

use super::{
    Flags, WriteError,
    consts::{RESERVED_1, RESERVED_2, VLM_MAGIC, VLM_VERSION, ZSTD_LEVEL},
    varint::encode_varint,
};

/// Writes `grid` as a compressed VLM file and returns the file size in bytes.
pub fn export_grid_to_vlm<P: AsRef<Path>>(path: P, grid: &VoxelGrid) -> Result<u64, WriteError> {
    let path = path.as_ref();
    let vlm_file = std::fs::File::create(path).map_err(|source| WriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = std::io::BufWriter::new(vlm_file);

    write_vlm(&mut writer, grid, Flags::DEFAULT)?;

    let vlm_file = writer.into_inner().map_err(|err| err.into_error())?;
    vlm_file.sync_all()?;

    Ok(vlm_file.metadata()?.len())
}

/// Encodes `grid` as a VLM container into `writer`.
pub fn write_vlm<W: Write>(writer: &mut W, grid: &VoxelGrid, flags: Flags) -> Result<(), WriteError> {
    let geometry = grid.geometry();
    let size = geometry.dims.size();

    writer.write_all(&VLM_MAGIC)?;
    writer.write_u16::<BigEndian>(VLM_VERSION)?;
    writer.write_u16::<BigEndian>(flags.bits())?;
    writer.write_u32::<BigEndian>(RESERVED_1)?;
    writer.write_u32::<BigEndian>(RESERVED_2)?;

    writer.write_u32::<BigEndian>(size.x)?;
    writer.write_u32::<BigEndian>(size.y)?;
    writer.write_u32::<BigEndian>(size.z)?;

    write_vec3(writer, geometry.spacing)?;
    write_vec3(writer, geometry.origin)?;
    for row in 0..3 {
        write_vec3(writer, geometry.direction.row(row))?;
    }

    let data = encode_runs(grid.voxels());

    let mut md5_hasher = Md5::new();
    md5_hasher.update(&data);
    let md5_hash = md5_hasher.finalize();

    writer.write_all(&md5_hash)?;

    let raw_len = data.len();
    let data = if flags.contains(Flags::COMPRESSED) {
        zstd::stream::encode_all(data.as_slice(), ZSTD_LEVEL)?
    } else {
        data
    };

    let data_len = u32::try_from(data.len()).map_err(|_| WriteError::PayloadTooLarge(data.len()))?;
    writer.write_u32::<BigEndian>(data_len)?;
    writer.write_all(&data)?;
    writer.flush()?;

    debug!(
        "Encoded VLM grid {} ({raw_len} payload bytes, {} stored)",
        geometry.dims,
        data.len()
    );

    Ok(())
}

fn write_vec3<W: Write>(writer: &mut W, value: Vec3) -> std::io::Result<()> {
    writer.write_f32::<BigEndian>(value.x)?;
    writer.write_f32::<BigEndian>(value.y)?;
    writer.write_f32::<BigEndian>(value.z)
}

/// Collapses the voxel buffer into `(label, run length)` varint pairs.
fn encode_runs(voxels: &[Label]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut iter = voxels.iter().copied().peekable();

    while let Some(label) = iter.next() {
        let mut run = 1u64;
        while iter.next_if_eq(&label).is_some() {
            run += 1;
        }

        encode_varint(label as u64, &mut data);
        encode_varint(run, &mut data);
    }

    data
}
