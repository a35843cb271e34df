//! Magic-number classification for thin and fat Mach-O containers
//!
//! Magic words are always read as little-endian 32-bit values. A `_CIGAM`
//! value therefore means every field after it is stored big-endian.

use crate::error::{ParseError, ParseResult};
use crate::source::ByteSource;
use unibin_core::{ContainerKind, Endianness};

/// 32-bit Mach-O
pub const MH_MAGIC: u32 = 0xFEEDFACE;
/// 32-bit Mach-O, big endian
pub const MH_CIGAM: u32 = 0xCEFAEDFE;
/// 64-bit Mach-O
pub const MH_MAGIC_64: u32 = 0xFEEDFACF;
/// 64-bit Mach-O, big endian
pub const MH_CIGAM_64: u32 = 0xCFFAEDFE;
/// Universal binary
pub const FAT_MAGIC: u32 = 0xCAFEBABE;
/// Universal binary, big endian
pub const FAT_CIGAM: u32 = 0xBEBAFECA;

/// Size of a magic word
pub const MAGIC_SIZE: usize = 4;

static THIN_MAGICS: [u32; 4] = [MH_MAGIC, MH_CIGAM, MH_MAGIC_64, MH_CIGAM_64];
static FAT_MAGICS: [u32; 2] = [FAT_MAGIC, FAT_CIGAM];
static SWAPPED_MAGICS: [u32; 3] = [MH_CIGAM, MH_CIGAM_64, FAT_CIGAM];

/// What a magic word announces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicKind {
    Thin,
    Fat,
    Unsupported,
}

impl MagicKind {
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            MagicKind::Thin => Some(ContainerKind::Thin),
            MagicKind::Fat => Some(ContainerKind::Fat),
            MagicKind::Unsupported => None,
        }
    }
}

pub fn classify(magic: u32) -> MagicKind {
    if THIN_MAGICS.contains(&magic) {
        MagicKind::Thin
    } else if FAT_MAGICS.contains(&magic) {
        MagicKind::Fat
    } else {
        MagicKind::Unsupported
    }
}

pub fn is_supported(magic: u32) -> bool {
    classify(magic) != MagicKind::Unsupported
}

pub fn is_thin(magic: u32) -> bool {
    classify(magic) == MagicKind::Thin
}

/// True for the byte-reversed variants of either family
pub fn is_swapped(magic: u32) -> bool {
    SWAPPED_MAGICS.contains(&magic)
}

pub fn endianness(magic: u32) -> Endianness {
    Endianness::from_swapped(is_swapped(magic))
}

/// Read the raw magic word at `offset`
pub fn read_magic(source: &ByteSource, offset: u64) -> ParseResult<u32> {
    source.read_u32_at(offset, Endianness::Native)
}

/// Raw magic word from the start of a buffer
pub fn magic_from_bytes(data: &[u8]) -> Option<u32> {
    let bytes: [u8; MAGIC_SIZE] = data.get(..MAGIC_SIZE)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// Classify the magic at the start of `source`, failing on anything outside
/// the recognized families
pub fn sniff(source: &ByteSource) -> ParseResult<(u32, ContainerKind)> {
    let magic = read_magic(source, 0)?;
    let kind = classify(magic)
        .container_kind()
        .ok_or(ParseError::UnsupportedMagic(magic))?;
    Ok((magic, kind))
}
