pub const VLM_VERSION: u16 = 0x0100;
pub const VLM_MAGIC: [u8; 12] = *b"VoxLabelGrid";

pub const RESERVED_1: u32 = 0;
pub const RESERVED_2: u32 = 0;

pub const ZSTD_LEVEL: i32 = 7;
