//! Common traits and helpers for slice decoding

use crate::error::{ParseError, ParseResult};
use crate::source::ByteSource;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Decodes one slice starting at a file offset of a source.
///
/// Implementations read whatever header bytes they need through the source
/// and fail with any error; the collector records the failure and moves on.
pub trait SliceDecoder {
    type Slice;

    fn decode(&self, source: &ByteSource, offset: u64) -> anyhow::Result<Self::Slice>;
}

impl<F, S> SliceDecoder for F
where
    F: Fn(&ByteSource, u64) -> anyhow::Result<S>,
{
    type Slice = S;

    fn decode(&self, source: &ByteSource, offset: u64) -> anyhow::Result<S> {
        self(source, offset)
    }
}

/// Helper to read primitives from byte slices
pub struct BinaryReader<'a> {
    data: &'a [u8],
    offset: usize,
    little_endian: bool,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8], little_endian: bool) -> Self {
        Self {
            data,
            offset: 0,
            little_endian,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn read_u32(&mut self) -> ParseResult<u32> {
        if self.remaining() < 4 {
            return Err(ParseError::truncated(self.offset as u64, 4, self.remaining()));
        }
        let bytes = &self.data[self.offset..self.offset + 4];
        self.offset += 4;
        Ok(if self.little_endian {
            LittleEndian::read_u32(bytes)
        } else {
            BigEndian::read_u32(bytes)
        })
    }

    pub fn skip(&mut self, count: usize) -> ParseResult<()> {
        if self.remaining() < count {
            return Err(ParseError::truncated(self.offset as u64, count, self.remaining()));
        }
        self.offset += count;
        Ok(())
    }
}
