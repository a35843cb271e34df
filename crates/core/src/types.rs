//! Common types used throughout unibin

use serde::{Deserialize, Serialize};

/// Byte order of a container relative to the little-endian on-disk reading
/// of its magic word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    /// Fields are stored little-endian and are read as-is
    Native,
    /// Fields are stored big-endian and every field is byte-reversed on read
    Swapped,
}

impl Endianness {
    pub fn from_swapped(swapped: bool) -> Self {
        if swapped {
            Endianness::Swapped
        } else {
            Endianness::Native
        }
    }

    pub fn is_swapped(&self) -> bool {
        matches!(self, Endianness::Swapped)
    }

    pub fn is_little_endian(&self) -> bool {
        !self.is_swapped()
    }
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Native => write!(f, "native"),
            Endianness::Swapped => write!(f, "swapped"),
        }
    }
}

/// Kind of container a magic word announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    /// A single Mach-O image
    Thin,
    /// A universal container bundling several Mach-O images
    Fat,
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::Thin => write!(f, "thin"),
            ContainerKind::Fat => write!(f, "fat"),
        }
    }
}

/// Architecture type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    X86,
    X64,
    Arm32,
    Arm64,
    Arm64_32,
    PowerPC,
    PowerPC64,
    Unknown,
}

impl Architecture {
    pub fn is_64bit(&self) -> bool {
        matches!(
            self,
            Architecture::X64 | Architecture::Arm64 | Architecture::PowerPC64
        )
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Architecture::X86 => "i386",
            Architecture::X64 => "x86_64",
            Architecture::Arm32 => "arm",
            Architecture::Arm64 => "arm64",
            Architecture::Arm64_32 => "arm64_32",
            Architecture::PowerPC => "ppc",
            Architecture::PowerPC64 => "ppc64",
            Architecture::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}
