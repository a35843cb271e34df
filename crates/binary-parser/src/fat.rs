//! Fat (universal) header and architecture table decoding

use crate::error::{ParseError, ParseResult};
use crate::macho::{architecture_for_cpu, CpuTypeFlags};
use crate::magic::{self, read_magic};
use crate::source::ByteSource;
use scroll::{Pread, SizeWith};
use tracing::debug;
use unibin_core::{Architecture, Endianness};

/// Size of `FatHeader` on disk
pub const FAT_HEADER_SIZE: usize = 8;
/// Size of one `ArchDescriptor` on disk
pub const ARCH_DESCRIPTOR_SIZE: usize = 20;

/// Header at the start of a universal binary.
///
/// `magic` is kept exactly as read; only `arch_count` follows the container
/// byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FatHeader {
    pub magic: u32,
    pub arch_count: u32,
}

/// One entry of the architecture table, decoded in the container byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pread, SizeWith)]
pub struct ArchDescriptor {
    pub cpu_type: u32,
    pub cpu_subtype: u32,
    pub file_offset: u32,
    pub size: u32,
    /// Power of two
    pub alignment: u32,
}

impl ArchDescriptor {
    pub fn architecture(&self) -> Architecture {
        architecture_for_cpu(self.cpu_type)
    }

    pub fn is_64bit(&self) -> bool {
        CpuTypeFlags::from_bits_truncate(self.cpu_type).contains(CpuTypeFlags::ABI64)
    }

    /// First byte past the slice payload
    pub fn end_offset(&self) -> u64 {
        self.file_offset as u64 + self.size as u64
    }

    /// Alignment in bytes, if the exponent is representable
    pub fn alignment_bytes(&self) -> Option<u64> {
        1u64.checked_shl(self.alignment)
    }
}

fn scroll_endian(endianness: Endianness) -> scroll::Endian {
    match endianness {
        Endianness::Native => scroll::LE,
        Endianness::Swapped => scroll::BE,
    }
}

/// Fail if the source starts with a thin Mach-O magic
pub fn verify_not_thin(source: &ByteSource) -> ParseResult<()> {
    let magic = read_magic(source, 0)?;
    if magic::is_thin(magic) {
        return Err(ParseError::format(format!(
            "expected a fat header but found thin magic {:#010x}",
            magic
        )));
    }
    Ok(())
}

/// Decode the fat header and its architecture table, in file order
pub fn parse_fat_header(
    source: &ByteSource,
    endianness: Endianness,
    max_arches: u32,
) -> ParseResult<(FatHeader, Vec<ArchDescriptor>)> {
    let header = FatHeader {
        magic: read_magic(source, 0)?,
        arch_count: source.read_u32_at(magic::MAGIC_SIZE as u64, endianness)?,
    };

    if header.arch_count > max_arches {
        return Err(ParseError::TooManyArches {
            count: header.arch_count,
            limit: max_arches,
        });
    }

    let count = header.arch_count as usize;
    let table_len = count.saturating_mul(ARCH_DESCRIPTOR_SIZE);
    let table = source.read_exact_at(FAT_HEADER_SIZE as u64, table_len)?;
    let ctx = scroll_endian(endianness);

    let mut descriptors = Vec::with_capacity(count);
    let mut cursor = 0usize;
    for _ in 0..count {
        let descriptor = table
            .gread_with::<ArchDescriptor>(&mut cursor, ctx)
            .map_err(|e: scroll::Error| ParseError::format(e.to_string()))?;
        debug!(
            "Fat arch {}: cputype {:#x} at {:#x} ({} bytes)",
            descriptors.len(),
            descriptor.cpu_type,
            descriptor.file_offset,
            descriptor.size
        );
        descriptors.push(descriptor);
    }

    Ok((header, descriptors))
}
