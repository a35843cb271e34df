//! Thin/fat Mach-O container parsing
//!
//! Recognizes single-image Mach-O files and universal binaries, decodes the
//! fat architecture table, and hands every candidate slice to a
//! [`SliceDecoder`]. Slices that fail to decode are recorded on the
//! [`Archive`] instead of failing the whole parse.

pub mod archive;
pub mod common;
pub mod error;
pub mod fat;
pub mod macho;
pub mod magic;
pub mod source;

pub use archive::{Archive, DroppedSlice, ParseOutcome, SliceCollector};
pub use common::SliceDecoder;
pub use error::{ParseError, ParseResult, SliceDecodeError};
pub use fat::{ArchDescriptor, FatHeader};
pub use macho::{MachHeaderDecoder, MachSlice};
pub use source::ByteSource;

use std::path::Path;
use unibin_core::{ContainerKind, ParserConfig};

/// Detect container kind from magic bytes
pub fn detect_container(data: &[u8]) -> Option<ContainerKind> {
    magic::magic_from_bytes(data).and_then(|m| magic::classify(m).container_kind())
}

/// Parse the file at `path` with the default config and Mach-O header decoder
pub fn parse(path: impl AsRef<Path>) -> ParseResult<Archive<MachSlice>> {
    parse_with(path, &ParserConfig::default(), &MachHeaderDecoder)
}

/// Parse the file at `path` with an explicit config and decoder
pub fn parse_with<D: SliceDecoder>(
    path: impl AsRef<Path>,
    config: &ParserConfig,
    decoder: &D,
) -> ParseResult<Archive<D::Slice>> {
    config.validate()?;
    let source = ByteSource::open_with(path, config.use_mmap)?;
    SliceCollector::new(decoder, config).collect(source)
}

/// Parse an in-memory buffer with the default config and Mach-O header decoder
pub fn parse_bytes(data: impl Into<Vec<u8>>) -> ParseResult<Archive<MachSlice>> {
    parse_bytes_with(data, &ParserConfig::default(), &MachHeaderDecoder)
}

/// Parse an in-memory buffer with an explicit config and decoder
pub fn parse_bytes_with<D: SliceDecoder>(
    data: impl Into<Vec<u8>>,
    config: &ParserConfig,
    decoder: &D,
) -> ParseResult<Archive<D::Slice>> {
    config.validate()?;
    SliceCollector::new(decoder, config).collect(ByteSource::from_bytes(data))
}
