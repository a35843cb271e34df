//! File-based parsing of thin and universal Mach-O fixtures

use std::io::Write;
use tempfile::NamedTempFile;
use unibin_binary_parser::macho::{CPU_TYPE_ARM64, CPU_TYPE_X86, CPU_TYPE_X86_64};
use unibin_binary_parser::{
    parse, parse_with, ByteSource, MachHeaderDecoder, ParseError, ParseOutcome, SliceDecodeError,
};
use unibin_core::{Architecture, Endianness, ParserConfig};

const MH_MAGIC: u32 = 0xfeedface;
const MH_MAGIC_64: u32 = 0xfeedfacf;

fn write_fixture(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

fn words_le(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

fn words_be(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn thin_64(cpu_type: u32) -> Vec<u8> {
    words_le(&[MH_MAGIC_64, cpu_type, 3, 2, 0, 0, 0, 0])
}

fn thin_32(cpu_type: u32) -> Vec<u8> {
    words_le(&[MH_MAGIC, cpu_type, 3, 2, 0, 0, 0])
}

/// Native-order (little-endian) universal header with two slices at 0x40
/// and 0x80
fn native_fat_pair(first: Vec<u8>, second: Vec<u8>) -> Vec<u8> {
    let mut data = words_le(&[0xcafebabe, 2]);
    data.extend(words_le(&[CPU_TYPE_X86_64, 3, 0x40, first.len() as u32, 4]));
    data.extend(words_le(&[CPU_TYPE_ARM64, 0, 0x80, second.len() as u32, 4]));
    data.resize(0x40, 0);
    data.extend(first);
    data.resize(0x80, 0);
    data.extend(second);
    data
}

#[test]
fn thin_file_has_one_slice() {
    let file = write_fixture(&thin_64(CPU_TYPE_X86_64));
    let archive = parse(file.path()).unwrap();

    assert!(!archive.is_fat());
    assert!(!archive.is_swapped());
    assert!(archive.fat_header().is_none());
    assert_eq!(archive.slices().len(), 1);
    assert_eq!(archive.slices()[0].architecture(), Architecture::X64);
    assert_eq!(archive.source().path(), Some(file.path()));
}

#[test]
fn synthetic_fat_round_trip() {
    let data = native_fat_pair(thin_64(CPU_TYPE_X86_64), thin_64(CPU_TYPE_ARM64));
    let file = write_fixture(&data);
    let archive = parse(file.path()).unwrap();

    assert!(archive.is_fat());
    assert_eq!(archive.endianness(), Endianness::Native);
    assert_eq!(archive.fat_header().unwrap().magic, 0xcafebabe);
    assert_eq!(archive.slices().len(), 2);
    assert_eq!(archive.slices()[0].offset, 0x40);
    assert_eq!(archive.slices()[1].offset, 0x80);
    assert_eq!(archive.slices()[1].architecture(), Architecture::Arm64);
    assert_eq!(archive.outcome(), ParseOutcome::Complete);
}

#[test]
fn slices_keep_descriptor_order_not_offset_order() {
    let mut data = words_le(&[0xcafebabe, 2]);
    data.extend(words_le(&[CPU_TYPE_ARM64, 0, 0x80, 32, 4]));
    data.extend(words_le(&[CPU_TYPE_X86, 3, 0x40, 28, 4]));
    data.resize(0x40, 0);
    data.extend(thin_32(CPU_TYPE_X86));
    data.resize(0x80, 0);
    data.extend(thin_64(CPU_TYPE_ARM64));

    let file = write_fixture(&data);
    let archive = parse(file.path()).unwrap();
    let offsets: Vec<u64> = archive.slices().iter().map(|s| s.offset).collect();
    assert_eq!(offsets, vec![0x80, 0x40]);
}

#[test]
fn swapped_fat_header_decodes_arch_count() {
    let mut data = 0xbebafecau32.to_le_bytes().to_vec();
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x02]);
    data.extend(words_be(&[CPU_TYPE_X86_64, 3, 0x40, 32, 4]));
    data.extend(words_be(&[CPU_TYPE_ARM64, 0, 0x80, 32, 4]));
    data.resize(0x40, 0);
    data.extend(thin_64(CPU_TYPE_X86_64));
    data.resize(0x80, 0);
    data.extend(thin_64(CPU_TYPE_ARM64));

    let file = write_fixture(&data);
    let archive = parse(file.path()).unwrap();

    assert!(archive.is_swapped());
    assert_eq!(archive.fat_header().unwrap().arch_count, 2);
    assert_eq!(archive.slices().len(), 2);
    // Slices carry their own byte order
    assert_eq!(archive.slices()[0].endianness, Endianness::Native);
}

#[test]
fn one_garbage_slice_is_tolerated() {
    let data = native_fat_pair(thin_64(CPU_TYPE_X86_64), vec![0x55; 32]);
    let file = write_fixture(&data);
    let archive = parse(file.path()).unwrap();

    assert_eq!(archive.slices().len(), 1);
    assert_eq!(archive.outcome(), ParseOutcome::Partial);
    let dropped = &archive.dropped()[0];
    assert_eq!(dropped.index, Some(1));
    assert_eq!(dropped.offset, 0x80);
    assert_eq!(dropped.error, SliceDecodeError::BadMagic { magic: 0x55555555 });
}

#[test]
fn unsupported_magic_fails_before_header() {
    // Only the magic is present; reading any header would report truncation
    let file = write_fixture(&0xdeadbeefu32.to_le_bytes());
    let err = parse(file.path()).unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedMagic(0xdeadbeef)));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse(dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, ParseError::Io(_)));
}

#[test]
fn parsing_is_pure() {
    let data = native_fat_pair(thin_64(CPU_TYPE_X86_64), vec![0x55; 32]);
    let file = write_fixture(&data);

    let mapped = parse(file.path()).unwrap();
    let again = parse(file.path()).unwrap();
    assert_eq!(mapped, again);

    let config = ParserConfig {
        use_mmap: false,
        ..ParserConfig::default()
    };
    let buffered = parse_with(file.path(), &config, &MachHeaderDecoder).unwrap();
    assert_eq!(mapped, buffered);
}

#[test]
fn custom_decoder_sees_every_candidate_offset() {
    let data = native_fat_pair(thin_64(CPU_TYPE_X86_64), thin_64(CPU_TYPE_ARM64));
    let file = write_fixture(&data);

    let decoder = |_: &ByteSource, offset: u64| -> anyhow::Result<u64> {
        anyhow::ensure!(offset != 0x80, "rejecting {:#x}", offset);
        Ok(offset)
    };
    let archive = parse_with(file.path(), &ParserConfig::default(), &decoder).unwrap();

    assert_eq!(archive.slices(), &[0x40]);
    assert_eq!(
        archive.dropped()[0].error,
        SliceDecodeError::Decoder("rejecting 0x80".to_string())
    );
}
