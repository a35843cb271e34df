//! Error types for container parsing

use thiserror::Error;

/// Fatal errors that abort construction of an archive
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported magic number {0:#010x}")]
    UnsupportedMagic(u32),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Truncated data at offset {offset:#x}: expected {expected} bytes, got {actual}")]
    TruncatedData {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Fat header declares {count} architectures, limit is {limit}")]
    TooManyArches { count: u32, limit: u32 },

    #[error(transparent)]
    Config(#[from] unibin_core::Error),
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

impl ParseError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn truncated(offset: u64, expected: usize, actual: usize) -> Self {
        Self::TruncatedData {
            offset,
            expected,
            actual,
        }
    }

    /// Structural problems with the container itself
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::TruncatedData { .. } | Self::TooManyArches { .. }
        )
    }
}

/// Why a candidate slice was dropped from an archive.
///
/// These never escape `parse`; they are recorded on the archive instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SliceDecodeError {
    #[error("no Mach-O magic at slice offset (found {magic:#010x})")]
    BadMagic { magic: u32 },

    #[error("slice offset leaves only {available} bytes")]
    Truncated { available: usize },

    #[error("slice decoder failed: {0}")]
    Decoder(String),
}

impl SliceDecodeError {
    pub fn decoder(err: &anyhow::Error) -> Self {
        Self::Decoder(format!("{:#}", err))
    }
}
