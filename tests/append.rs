//! Appending to existing archives and to arbitrary files.

mod common;

use std::io::{Cursor, Seek, SeekFrom, Write};

use common::{create_archive, open, verify_archive_contents};
use zipcore::{ArchiveOptions, CompressionMethod, Mode, ZipArchive};

#[test]
fn test_append_to_archive() {
    let bytes = create_archive(&[("one", b"1"), ("two", b"22")]).unwrap();
    let mut archive = ZipArchive::append(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.mode(), Mode::Append);
    assert_eq!(archive.len(), 2);
    // Existing entries stay readable in append mode.
    assert_eq!(archive.read("two").unwrap(), b"22");

    archive.write_bytes("three", b"333").unwrap();
    let bytes = archive.finish().unwrap().into_inner();
    verify_archive_contents(&bytes, &[("one", b"1"), ("two", b"22"), ("three", b"333")]);
}

#[test]
fn test_append_overwrites_old_directory() {
    let bytes = create_archive(&[("one", b"1")]).unwrap();
    let original_len = bytes.len();
    let mut archive = ZipArchive::append(Cursor::new(bytes)).unwrap();
    archive.write_bytes("two", b"2").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    // One local header with name and data, one central record with name.
    assert_eq!(bytes.len(), original_len + (30 + 3 + 1) + (46 + 3));
    assert_eq!(common::find(&bytes, b"PK\x05\x06"), Some(bytes.len() - 22));
}

#[test]
fn test_append_without_changes_keeps_bytes() {
    let bytes = create_archive(&[("one", b"1")]).unwrap();
    let mut archive = ZipArchive::append(Cursor::new(bytes.clone())).unwrap();
    archive.close().unwrap();
    drop(archive);

    let archive = ZipArchive::append(Cursor::new(bytes.clone())).unwrap();
    assert_eq!(archive.finish().unwrap().into_inner(), bytes);
}

#[test]
fn test_append_shrinks_after_comment_removed() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_bytes("a", b"1").unwrap();
    archive.set_comment(vec![b'c'; 1000]);
    let bytes = archive.finish().unwrap().into_inner();
    let with_comment = bytes.len();

    let mut archive = ZipArchive::append(Cursor::new(bytes)).unwrap();
    archive.set_comment("");
    let bytes = archive.finish().unwrap().into_inner();
    assert_eq!(bytes.len(), with_comment - 1000);
    assert!(open(bytes).comment().is_empty());
}

#[test]
fn test_append_to_self_extractor() {
    let stub = b"MZ\x90\x00 fake executable stub ".repeat(20);
    let zip = create_archive(&[("inside", b"payload")]).unwrap();
    let mut bytes = stub.clone();
    bytes.extend_from_slice(&zip);

    let archive = open(bytes.clone());
    assert_eq!(archive.read("inside").unwrap(), b"payload");
    assert_eq!(archive.entry("inside").unwrap().header_offset, stub.len() as u64);
    drop(archive);

    let mut archive = ZipArchive::append(Cursor::new(bytes)).unwrap();
    archive.write_bytes("added", b"later").unwrap();
    let bytes = archive.finish().unwrap().into_inner();
    assert!(bytes.starts_with(&stub));
    verify_archive_contents(&bytes, &[("inside", b"payload"), ("added", b"later")]);
}

#[test]
fn test_append_to_non_zip_file() {
    let prefix = b"#!/bin/sh\necho self extracting\nexit 0\n".to_vec();
    let mut archive = ZipArchive::append(Cursor::new(prefix.clone())).unwrap();
    assert!(archive.is_empty());
    archive.write_bytes("payload.txt", b"appended").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    assert!(bytes.starts_with(&prefix));
    let archive = open(bytes);
    assert_eq!(archive.entry("payload.txt").unwrap().header_offset, prefix.len() as u64);
    assert_eq!(archive.read("payload.txt").unwrap(), b"appended");
}

#[test]
fn test_append_to_empty_file_creates_archive() {
    let archive = ZipArchive::append(Cursor::new(Vec::new())).unwrap();
    let bytes = archive.finish().unwrap().into_inner();
    assert_eq!(bytes.len(), 22);
    assert!(open(bytes).is_empty());
}

#[test]
fn test_append_with_compression() {
    let text = common::compressible(30_000);
    let bytes = create_archive(&[("stored", b"plain")]).unwrap();
    let mut archive = ZipArchive::append(Cursor::new(bytes))
        .unwrap()
        .with_options(ArchiveOptions::new().compression(CompressionMethod::Deflated));
    archive.write_bytes("deflated", &text).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    assert_eq!(
        archive.entry("deflated").unwrap().compression().unwrap(),
        CompressionMethod::Deflated
    );
    assert_eq!(archive.read("deflated").unwrap(), text);
    assert_eq!(archive.read("stored").unwrap(), b"plain");
}

#[test]
fn test_append_path_creates_and_extends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grow.zip");

    let mut archive = ZipArchive::append_path(&path).unwrap();
    archive.write_bytes("first", b"1").unwrap();
    archive.close().unwrap();

    let mut archive = ZipArchive::append_path(&path).unwrap();
    archive.write_bytes("second", b"2").unwrap();
    archive.close().unwrap();

    let archive = ZipArchive::open_path(&path).unwrap();
    assert_eq!(archive.names().collect::<Vec<_>>(), ["first", "second"]);
}

#[test]
fn test_append_path_truncates_stale_tail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tail.zip");
    let mut archive = ZipArchive::create_path(&path).unwrap();
    archive.write_bytes("a", b"1").unwrap();
    archive.set_comment(vec![b'x'; 500]);
    archive.close().unwrap();
    let before = std::fs::metadata(&path).unwrap().len();

    let mut archive = ZipArchive::append_path(&path).unwrap();
    archive.set_comment("");
    archive.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), before - 500);
}

#[test]
fn test_create_after_existing_content() {
    let mut cursor = Cursor::new(Vec::new());
    cursor.write_all(b"header block").unwrap();
    cursor.seek(SeekFrom::Start(6)).unwrap();
    let mut archive = ZipArchive::create(cursor).unwrap();
    archive.write_bytes("x", b"y").unwrap();
    let bytes = archive.finish().unwrap().into_inner();
    assert!(bytes.starts_with(b"header"));
    assert_eq!(open(bytes).read("x").unwrap(), b"y");
}
