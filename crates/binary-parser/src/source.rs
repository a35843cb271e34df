//! Random-access byte sources backing an archive

use crate::error::{ParseError, ParseResult};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use unibin_core::Endianness;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

/// Read-only view over one input, either a mapped file or an owned buffer.
///
/// The underlying file descriptor is closed as soon as the mapping exists;
/// the mapping itself is released when the source is dropped.
pub struct ByteSource {
    backing: Backing,
    path: Option<PathBuf>,
}

impl ByteSource {
    /// Open a file, memory-mapping it
    pub fn open(path: impl AsRef<Path>) -> ParseResult<Self> {
        Self::open_with(path, true)
    }

    /// Open a file, either mapping it or reading it into memory
    pub fn open_with(path: impl AsRef<Path>, use_mmap: bool) -> ParseResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let len = file.metadata()?.len();

        // Zero-length mappings are rejected on some platforms.
        let backing = if use_mmap && len > 0 {
            // SAFETY: the map is read-only and the source assumes the file is
            // not truncated underneath it while the archive is alive.
            Backing::Mapped(unsafe { Mmap::map(&file)? })
        } else {
            let mut data = Vec::with_capacity(len as usize);
            file.read_to_end(&mut data)?;
            Backing::Owned(data)
        };

        let source = Self {
            backing,
            path: Some(path.to_path_buf()),
        };
        debug!(
            "Opened {} ({} bytes, mapped: {})",
            path.display(),
            source.len(),
            matches!(source.backing, Backing::Mapped(_))
        );

        Ok(source)
    }

    /// Wrap an in-memory buffer
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            backing: Backing::Owned(data.into()),
            path: None,
        }
    }

    /// Location this source was opened from, if it came from a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Mapped(map) => &map[..],
            Backing::Owned(data) => &data[..],
        }
    }

    pub fn len(&self) -> u64 {
        self.as_bytes().len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Up to `len` bytes starting at `offset`; shorter (possibly empty) when
    /// the source ends early
    pub fn read_at(&self, offset: u64, len: usize) -> &[u8] {
        let data = self.as_bytes();
        let start = match usize::try_from(offset) {
            Ok(start) if start < data.len() => start,
            _ => return &[],
        };
        let end = start.saturating_add(len).min(data.len());
        &data[start..end]
    }

    /// Exactly `len` bytes at `offset`, or a truncation error
    pub fn read_exact_at(&self, offset: u64, len: usize) -> ParseResult<&[u8]> {
        let bytes = self.read_at(offset, len);
        if bytes.len() < len {
            return Err(ParseError::truncated(offset, len, bytes.len()));
        }
        Ok(bytes)
    }

    /// A 32-bit word at `offset`, byte-reversed when `endianness` is swapped
    pub fn read_u32_at(&self, offset: u64, endianness: Endianness) -> ParseResult<u32> {
        let bytes = self.read_exact_at(offset, 4)?;
        Ok(match endianness {
            Endianness::Native => LittleEndian::read_u32(bytes),
            Endianness::Swapped => BigEndian::read_u32(bytes),
        })
    }
}

impl PartialEq for ByteSource {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ByteSource {}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("mapped", &matches!(self.backing, Backing::Mapped(_)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_at_clamps_to_end() {
        let source = ByteSource::from_bytes(vec![1, 2, 3, 4, 5]);
        assert_eq!(source.read_at(3, 10), &[4, 5]);
        assert!(source.read_at(5, 1).is_empty());
        assert!(source.read_at(u64::MAX, 4).is_empty());
    }

    #[test]
    fn test_read_exact_reports_truncation() {
        let source = ByteSource::from_bytes(vec![0u8; 6]);
        match source.read_exact_at(4, 4) {
            Err(ParseError::TruncatedData { offset, expected, actual }) => {
                assert_eq!((offset, expected, actual), (4, 4, 2));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_read_u32_both_orders() {
        let source = ByteSource::from_bytes(vec![0x00, 0x00, 0x00, 0x02]);
        assert_eq!(source.read_u32_at(0, Endianness::Native).unwrap(), 0x0200_0000);
        assert_eq!(source.read_u32_at(0, Endianness::Swapped).unwrap(), 2);
    }

    #[test]
    fn test_open_mapped_and_buffered() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xca, 0xfe, 0xba, 0xbe]).unwrap();
        file.flush().unwrap();

        let mapped = ByteSource::open(file.path()).unwrap();
        let buffered = ByteSource::open_with(file.path(), false).unwrap();
        assert_eq!(mapped, buffered);
        assert_eq!(mapped.len(), 4);
        assert_eq!(mapped.path(), Some(file.path()));
    }

    #[test]
    fn test_buffered_read_matches_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xcf, 0xfa, 0xed, 0xfe, 0x07, 0x00]).unwrap();
        file.flush().unwrap();

        let source = ByteSource::open_with(file.path(), false).unwrap();
        assert_eq!(source.as_bytes(), &[0xcf, 0xfa, 0xed, 0xfe, 0x07, 0x00]);
    }

    #[test]
    fn test_open_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = ByteSource::open(file.path()).unwrap();
        assert!(source.is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ByteSource::open(dir.path().join("missing"));
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
