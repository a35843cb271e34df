//! Thin/fat archive construction

use crate::common::SliceDecoder;
use crate::error::{ParseResult, SliceDecodeError};
use crate::fat::{self, ArchDescriptor, FatHeader};
use crate::magic::{self, MAGIC_SIZE};
use crate::source::ByteSource;
use tracing::{debug, info, warn};
use unibin_core::{ContainerKind, Endianness, ParserConfig};

/// A candidate slice that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSlice {
    /// Position in the fat architecture table; `None` for a thin file
    pub index: Option<usize>,
    /// File offset the slice was expected at
    pub offset: u64,
    /// Table entry the slice came from; `None` for a thin file
    pub descriptor: Option<ArchDescriptor>,
    pub error: SliceDecodeError,
}

/// How completely the candidate slices were decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Every candidate decoded (including containers with no candidates)
    Complete,
    /// Some candidates were dropped, at least one slice remains
    Partial,
    /// Candidates existed but none decoded
    NoSlices,
}

/// Parsed thin or fat container.
///
/// Owns its source and the decoded slices; immutable once built.
#[derive(Debug, PartialEq, Eq)]
pub struct Archive<S> {
    source: ByteSource,
    endianness: Endianness,
    kind: ContainerKind,
    fat_header: Option<FatHeader>,
    slices: Vec<S>,
    dropped: Vec<DroppedSlice>,
}

impl<S> Archive<S> {
    pub fn source(&self) -> &ByteSource {
        &self.source
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn is_fat(&self) -> bool {
        self.kind == ContainerKind::Fat
    }

    pub fn is_swapped(&self) -> bool {
        self.endianness.is_swapped()
    }

    /// Present iff the archive is fat
    pub fn fat_header(&self) -> Option<&FatHeader> {
        self.fat_header.as_ref()
    }

    /// Decoded slices in architecture-table order
    pub fn slices(&self) -> &[S] {
        &self.slices
    }

    /// Candidates that failed to decode, in table order
    pub fn dropped(&self) -> &[DroppedSlice] {
        &self.dropped
    }

    pub fn outcome(&self) -> ParseOutcome {
        match (self.dropped.is_empty(), self.slices.is_empty()) {
            (true, _) => ParseOutcome::Complete,
            (false, false) => ParseOutcome::Partial,
            (false, true) => ParseOutcome::NoSlices,
        }
    }

    pub fn into_slices(self) -> Vec<S> {
        self.slices
    }
}

/// Walks a source's thin or fat layout and decodes each candidate slice
pub struct SliceCollector<'a, D> {
    decoder: &'a D,
    config: &'a ParserConfig,
}

impl<'a, D: SliceDecoder> SliceCollector<'a, D> {
    pub fn new(decoder: &'a D, config: &'a ParserConfig) -> Self {
        Self { decoder, config }
    }

    /// Build an archive from `source`.
    ///
    /// Fails only for an unsupported magic, a malformed fat header or table,
    /// or an I/O error; individual slice failures end up in
    /// [`Archive::dropped`]. The source is dropped on every error path.
    pub fn collect(&self, source: ByteSource) -> ParseResult<Archive<D::Slice>> {
        let (magic, kind) = magic::sniff(&source)?;
        let endianness = magic::endianness(magic);

        let archive = match kind {
            ContainerKind::Fat => self.collect_fat(source, endianness)?,
            ContainerKind::Thin => self.collect_thin(source, endianness),
        };

        info!(
            "Parsed {} archive ({}): {} slices, {} dropped",
            archive.kind,
            archive.endianness,
            archive.slices.len(),
            archive.dropped.len()
        );

        Ok(archive)
    }

    fn collect_fat(
        &self,
        source: ByteSource,
        endianness: Endianness,
    ) -> ParseResult<Archive<D::Slice>> {
        fat::verify_not_thin(&source)?;
        let (header, descriptors) =
            fat::parse_fat_header(&source, endianness, self.config.max_fat_arches)?;

        let mut slices = Vec::with_capacity(descriptors.len());
        let mut dropped = Vec::new();

        for (index, descriptor) in descriptors.into_iter().enumerate() {
            let offset = descriptor.file_offset as u64;
            match self.decode_candidate(&source, offset) {
                Ok(slice) => {
                    debug!(
                        "Slice {} ({}) decoded at {:#x}",
                        index,
                        descriptor.architecture(),
                        offset
                    );
                    slices.push(slice);
                }
                Err(error) => {
                    warn!("Dropping slice {} at {:#x}: {}", index, offset, error);
                    dropped.push(DroppedSlice {
                        index: Some(index),
                        offset,
                        descriptor: Some(descriptor),
                        error,
                    });
                }
            }
        }

        Ok(Archive {
            source,
            endianness,
            kind: ContainerKind::Fat,
            fat_header: Some(header),
            slices,
            dropped,
        })
    }

    fn collect_thin(&self, source: ByteSource, endianness: Endianness) -> Archive<D::Slice> {
        let mut slices = Vec::with_capacity(1);
        let mut dropped = Vec::new();

        match self.decoder.decode(&source, 0) {
            Ok(slice) => slices.push(slice),
            Err(err) => {
                let error = SliceDecodeError::decoder(&err);
                warn!("Thin image failed to decode: {}", error);
                dropped.push(DroppedSlice {
                    index: None,
                    offset: 0,
                    descriptor: None,
                    error,
                });
            }
        }

        Archive {
            source,
            endianness,
            kind: ContainerKind::Thin,
            fat_header: None,
            slices,
            dropped,
        }
    }

    /// Check the slice magic, then hand the offset to the decoder
    fn decode_candidate(
        &self,
        source: &ByteSource,
        offset: u64,
    ) -> Result<D::Slice, SliceDecodeError> {
        let bytes = source.read_at(offset, MAGIC_SIZE);
        let magic = magic::magic_from_bytes(bytes).ok_or(SliceDecodeError::Truncated {
            available: bytes.len(),
        })?;
        if !magic::is_thin(magic) {
            return Err(SliceDecodeError::BadMagic { magic });
        }

        self.decoder
            .decode(source, offset)
            .map_err(|err| SliceDecodeError::decoder(&err))
    }
}
