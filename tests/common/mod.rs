//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Cursor;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use zipcore::checksum::Crc32;
use zipcore::crypto::{HEADER_SIZE, ZipCryptoKeys};
use zipcore::format::flags;
use zipcore::format::records::{CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader};
use zipcore::storage::Source;
use zipcore::{ArchiveOptions, CompressionMethod, ZipArchive};

/// An archive opened from memory.
pub type MemArchive = ZipArchive<Source<Cursor<Vec<u8>>>>;

/// Creates an in-memory archive with the given options.
pub fn create_archive_with_options(
    options: ArchiveOptions,
    entries: &[(&str, &[u8])],
) -> zipcore::Result<Vec<u8>> {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new()))?.with_options(options);
    for (name, data) in entries {
        archive.write_bytes(name, data)?;
    }
    Ok(archive.finish()?.into_inner())
}

/// Creates an in-memory archive with stored entries.
pub fn create_archive(entries: &[(&str, &[u8])]) -> zipcore::Result<Vec<u8>> {
    create_archive_with_options(ArchiveOptions::default(), entries)
}

/// Opens archive bytes for reading.
pub fn open(bytes: Vec<u8>) -> MemArchive {
    ZipArchive::open(Cursor::new(bytes)).expect("Failed to open archive")
}

/// Verifies that archive contains expected entries with correct content.
pub fn verify_archive_contents(archive_bytes: &[u8], expected: &[(&str, &[u8])]) {
    let archive = open(archive_bytes.to_vec());
    assert_eq!(archive.len(), expected.len(), "entry count mismatch");
    for (name, data) in expected {
        let actual = archive
            .read(name)
            .unwrap_or_else(|e| panic!("Failed to read '{}': {}", name, e));
        assert_eq!(&actual, data, "content mismatch for '{}'", name);
    }
    assert_eq!(archive.test().unwrap(), None);
}

/// Compression methods enabled in this build.
pub fn supported_methods() -> Vec<CompressionMethod> {
    [
        CompressionMethod::Stored,
        CompressionMethod::Deflated,
        CompressionMethod::Bzip2,
        CompressionMethod::Lzma,
    ]
    .into_iter()
    .filter(|m| m.is_supported())
    .collect()
}

/// Deterministic pseudo-random bytes that do not compress.
pub fn incompressible(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

/// Text that compresses well.
pub fn compressible(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Finds the offset of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// One stored entry of a hand-built archive.
pub struct RawEntry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub password: Option<&'a [u8]>,
    pub flags: u16,
    pub method: u16,
    pub extract_version: u16,
    pub dos_time: u16,
}

impl<'a> RawEntry<'a> {
    pub fn stored(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            password: None,
            flags: 0,
            method: 0,
            extract_version: 20,
            dos_time: 0x6000,
        }
    }

    pub fn encrypted(name: &'a str, data: &'a [u8], password: &'a [u8]) -> Self {
        Self {
            password: Some(password),
            flags: flags::ENCRYPTED,
            ..Self::stored(name, data)
        }
    }
}

/// Builds an archive byte by byte, bypassing the writer.
///
/// Encrypted entries use ZipCrypto with a fixed header; a data descriptor
/// flag only changes the check byte, the sizes stay in the local header.
pub fn build_raw_archive(entries: &[RawEntry<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();
    for entry in entries {
        let crc32 = Crc32::compute(entry.data);
        let payload = match entry.password {
            Some(password) => {
                let mut keys = ZipCryptoKeys::new(password);
                let mut header = [0x5Au8; HEADER_SIZE];
                header[HEADER_SIZE - 1] = if entry.flags & flags::DATA_DESCRIPTOR != 0 {
                    (entry.dos_time >> 8) as u8
                } else {
                    (crc32 >> 24) as u8
                };
                header
                    .iter()
                    .chain(entry.data.iter())
                    .map(|&b| keys.encrypt_byte(b))
                    .collect()
            }
            None => entry.data.to_vec(),
        };

        let offset = out.len() as u32;
        LocalFileHeader {
            version_needed: entry.extract_version,
            flags: entry.flags,
            method: entry.method,
            time: entry.dos_time,
            date: 0x21,
            crc32,
            compressed_size: payload.len() as u32,
            uncompressed_size: entry.data.len() as u32,
            name_len: entry.name.len() as u16,
            extra_len: 0,
        }
        .write_to(&mut out);
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&payload);

        CentralDirectoryHeader {
            create_version: 20,
            create_system: 3,
            extract_version: entry.extract_version,
            flags: entry.flags,
            method: entry.method,
            time: entry.dos_time,
            date: 0x21,
            crc32,
            compressed_size: payload.len() as u32,
            uncompressed_size: entry.data.len() as u32,
            name_len: entry.name.len() as u16,
            header_offset: offset,
            ..Default::default()
        }
        .write_to(&mut central);
        central.extend_from_slice(entry.name.as_bytes());
    }

    let directory_offset = out.len() as u32;
    out.extend_from_slice(&central);
    EndOfCentralDirectory {
        entries_this_disk: entries.len() as u16,
        entries_total: entries.len() as u16,
        directory_size: central.len() as u32,
        directory_offset,
        ..Default::default()
    }
    .write_to(&mut out);
    out
}
