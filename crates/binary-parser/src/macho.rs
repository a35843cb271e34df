//! Mach-O header decoding for individual slices

use crate::common::{BinaryReader, SliceDecoder};
use crate::magic::{read_magic, MH_CIGAM, MH_CIGAM_64, MH_MAGIC, MH_MAGIC_64};
use crate::source::ByteSource;
use anyhow::{bail, ensure};
use std::ops::Range;
use tracing::debug;
use unibin_core::{Architecture, Endianness};

/// CPU types
pub const CPU_TYPE_X86: u32 = 7;
pub const CPU_TYPE_X86_64: u32 = CPU_TYPE_X86 | CpuTypeFlags::ABI64.bits();
pub const CPU_TYPE_ARM: u32 = 12;
pub const CPU_TYPE_ARM64: u32 = CPU_TYPE_ARM | CpuTypeFlags::ABI64.bits();
pub const CPU_TYPE_ARM64_32: u32 = CPU_TYPE_ARM | CpuTypeFlags::ABI64_32.bits();
pub const CPU_TYPE_POWERPC: u32 = 18;
pub const CPU_TYPE_POWERPC64: u32 = CPU_TYPE_POWERPC | CpuTypeFlags::ABI64.bits();

/// Header sizes
pub const MACH_HEADER_SIZE: usize = 28;
pub const MACH_HEADER_64_SIZE: usize = 32;

/// File types
const MH_OBJECT: u32 = 0x1;
const MH_EXECUTE: u32 = 0x2;
const MH_DYLIB: u32 = 0x6;
const MH_DYLINKER: u32 = 0x7;
const MH_BUNDLE: u32 = 0x8;
const MH_DSYM: u32 = 0xa;
const MH_KEXT_BUNDLE: u32 = 0xb;

bitflags::bitflags! {
    /// ABI bits carried in the high byte of a CPU type
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CpuTypeFlags: u32 {
        const ABI64 = 0x0100_0000;
        const ABI64_32 = 0x0200_0000;
    }
}

pub fn architecture_for_cpu(cpu_type: u32) -> Architecture {
    match cpu_type {
        CPU_TYPE_X86 => Architecture::X86,
        CPU_TYPE_X86_64 => Architecture::X64,
        CPU_TYPE_ARM => Architecture::Arm32,
        CPU_TYPE_ARM64 => Architecture::Arm64,
        CPU_TYPE_ARM64_32 => Architecture::Arm64_32,
        CPU_TYPE_POWERPC => Architecture::PowerPC,
        CPU_TYPE_POWERPC64 => Architecture::PowerPC64,
        _ => Architecture::Unknown,
    }
}

/// Mach-O file type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachFileType {
    Object,
    Execute,
    Dylib,
    Dylinker,
    Bundle,
    Dsym,
    KextBundle,
    Other(u32),
}

impl From<u32> for MachFileType {
    fn from(value: u32) -> Self {
        match value {
            MH_OBJECT => MachFileType::Object,
            MH_EXECUTE => MachFileType::Execute,
            MH_DYLIB => MachFileType::Dylib,
            MH_DYLINKER => MachFileType::Dylinker,
            MH_BUNDLE => MachFileType::Bundle,
            MH_DSYM => MachFileType::Dsym,
            MH_KEXT_BUNDLE => MachFileType::KextBundle,
            other => MachFileType::Other(other),
        }
    }
}

/// Decoded header of one Mach-O image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachSlice {
    /// File offset of the header
    pub offset: u64,
    pub magic: u32,
    /// Byte order of this slice, independent of any enclosing container
    pub endianness: Endianness,
    pub is_64bit: bool,
    pub cpu_type: u32,
    pub cpu_subtype: u32,
    pub file_type: MachFileType,
    pub ncmds: u32,
    pub sizeofcmds: u32,
    pub flags: u32,
}

impl MachSlice {
    pub fn architecture(&self) -> Architecture {
        architecture_for_cpu(self.cpu_type)
    }

    pub fn header_size(&self) -> usize {
        if self.is_64bit {
            MACH_HEADER_64_SIZE
        } else {
            MACH_HEADER_SIZE
        }
    }

    /// File range occupied by the load commands
    pub fn load_commands_range(&self) -> Range<u64> {
        let start = self.offset + self.header_size() as u64;
        start..start + self.sizeofcmds as u64
    }
}

/// Decodes the Mach-O header at a slice offset.
///
/// Load commands are bounds-checked against the source but not parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachHeaderDecoder;

impl SliceDecoder for MachHeaderDecoder {
    type Slice = MachSlice;

    fn decode(&self, source: &ByteSource, offset: u64) -> anyhow::Result<MachSlice> {
        let magic = read_magic(source, offset)?;

        let (is_64bit, endianness) = match magic {
            MH_MAGIC => (false, Endianness::Native),
            MH_MAGIC_64 => (true, Endianness::Native),
            MH_CIGAM => (false, Endianness::Swapped),
            MH_CIGAM_64 => (true, Endianness::Swapped),
            other => bail!("not a Mach-O header at {:#x}: magic {:#010x}", offset, other),
        };

        let header_size = if is_64bit {
            MACH_HEADER_64_SIZE
        } else {
            MACH_HEADER_SIZE
        };
        let bytes = source.read_exact_at(offset, header_size)?;
        let mut reader = BinaryReader::new(bytes, endianness.is_little_endian());

        reader.skip(4)?;
        let cpu_type = reader.read_u32()?;
        let cpu_subtype = reader.read_u32()?;
        let file_type = reader.read_u32()?;
        let ncmds = reader.read_u32()?;
        let sizeofcmds = reader.read_u32()?;
        let flags = reader.read_u32()?;

        if is_64bit {
            // reserved
            reader.skip(4)?;
        }

        let slice = MachSlice {
            offset,
            magic,
            endianness,
            is_64bit,
            cpu_type,
            cpu_subtype,
            file_type: MachFileType::from(file_type),
            ncmds,
            sizeofcmds,
            flags,
        };

        let commands = slice.load_commands_range();
        ensure!(
            commands.end <= source.len(),
            "load commands at {:#x} run {} bytes past the end of the file",
            commands.start,
            commands.end - source.len()
        );

        debug!(
            "Mach-O header at {:#x}: {} {:?}, {} load commands",
            offset,
            slice.architecture(),
            slice.file_type,
            ncmds
        );

        Ok(slice)
    }
}
