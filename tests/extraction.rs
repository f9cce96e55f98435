//! Extraction to the filesystem, including hostile entry names.

mod common;

use std::fs;

use common::{RawEntry, build_raw_archive, create_archive, open};
use zipcore::{DosDateTime, Entry, Error, ExtractOptions, PreserveMetadata, ZipArchive};

#[test]
fn test_extract_all() {
    let mut archive = ZipArchive::create(std::io::Cursor::new(Vec::new())).unwrap();
    archive.write_bytes("top.txt", b"top").unwrap();
    archive.mkdir("empty_dir").unwrap();
    archive.write_bytes("nested/deeper/file.bin", &[1, 2, 3]).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let dir = tempfile::tempdir().unwrap();
    let result = open(bytes)
        .extract_all(dir.path(), &ExtractOptions::default())
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(result.entries_extracted, 3);
    assert_eq!(result.bytes_extracted, 6);

    assert_eq!(fs::read(dir.path().join("top.txt")).unwrap(), b"top");
    assert!(dir.path().join("empty_dir").is_dir());
    assert_eq!(
        fs::read(dir.path().join("nested/deeper/file.bin")).unwrap(),
        [1, 2, 3]
    );
}

#[test]
fn test_extract_single_entry() {
    let archive = open(create_archive(&[("a/b.txt", b"single"), ("c", b"other")]).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let path = archive.extract("a/b.txt", dir.path()).unwrap();
    assert_eq!(path, dir.path().join("a").join("b.txt"));
    assert_eq!(fs::read(&path).unwrap(), b"single");
    assert!(!dir.path().join("c").exists());

    assert!(matches!(
        archive.extract("missing", dir.path()),
        Err(Error::EntryNotFound { .. })
    ));
}

#[test]
fn test_extract_replaces_existing_file() {
    let archive = open(create_archive(&[("f", b"new")]).unwrap());
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("f"), b"old contents that are longer").unwrap();
    archive.extract("f", dir.path()).unwrap();
    assert_eq!(fs::read(dir.path().join("f")).unwrap(), b"new");
}

#[test]
fn test_traversal_names_stay_inside_destination() {
    let bytes = build_raw_archive(&[
        RawEntry::stored("../escape.txt", b"1"),
        RawEntry::stored("/etc/absolute.txt", b"2"),
        RawEntry::stored("a/../../up.txt", b"3"),
        RawEntry::stored("./here/./dot.txt", b"4"),
    ]);
    let archive = open(bytes);
    let root = tempfile::tempdir().unwrap();
    let dest = root.path().join("dest");
    fs::create_dir(&dest).unwrap();

    let result = archive
        .extract_all(&dest, &ExtractOptions::default())
        .unwrap();
    assert!(result.is_ok(), "{:?}", result.failures);

    assert_eq!(fs::read(dest.join("escape.txt")).unwrap(), b"1");
    assert_eq!(fs::read(dest.join("etc/absolute.txt")).unwrap(), b"2");
    assert_eq!(fs::read(dest.join("a/up.txt")).unwrap(), b"3");
    assert_eq!(fs::read(dest.join("here/dot.txt")).unwrap(), b"4");
    assert!(!root.path().join("escape.txt").exists());
    assert!(!root.path().join("up.txt").exists());
}

#[test]
fn test_unusable_name_is_recorded_as_failure() {
    let bytes = build_raw_archive(&[
        RawEntry::stored("..", b"nowhere"),
        RawEntry::stored("fine.txt", b"ok"),
    ]);
    let archive = open(bytes);
    let dir = tempfile::tempdir().unwrap();

    let result = archive
        .extract_all(dir.path(), &ExtractOptions::default())
        .unwrap();
    assert!(result.is_err());
    assert_eq!(result.entries_extracted, 1);
    assert_eq!(result.entries_failed, 1);
    assert_eq!(result.failures[0].0, "..");
    assert!(result.failures[0].1.contains("Unsafe"));

    let entry = archive.entry("..").unwrap();
    assert!(matches!(
        archive.extract_entry(entry, dir.path(), &ExtractOptions::default()),
        Err(Error::PathTraversal { .. })
    ));
}

#[test]
fn test_corrupt_entry_recorded_and_others_extracted() {
    let mut bytes = create_archive(&[("bad", b"corrupted data"), ("good", b"fine")]).unwrap();
    let pos = common::find(&bytes, b"corrupted data").unwrap();
    bytes[pos] ^= 0xFF;

    let dir = tempfile::tempdir().unwrap();
    let result = open(bytes)
        .extract_all(dir.path(), &ExtractOptions::default())
        .unwrap();
    assert_eq!(result.entries_failed, 1);
    assert_eq!(result.failures[0].0, "bad");
    assert!(result.failures[0].1.contains("CRC mismatch"));
    assert_eq!(fs::read(dir.path().join("good")).unwrap(), b"fine");
}

#[test]
fn test_extract_from_closed_archive_fails() {
    let mut archive = open(create_archive(&[("a", b"1")]).unwrap());
    archive.close().unwrap();
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        archive.extract_all(dir.path(), &ExtractOptions::default()),
        Err(Error::Closed)
    ));
}

#[test]
fn test_preserve_modification_time() {
    let modified = DosDateTime::new(2020, 6, 15, 10, 20, 30).unwrap();
    let mut archive = ZipArchive::create(std::io::Cursor::new(Vec::new())).unwrap();
    archive
        .write_entry_bytes(Entry::new("dated.txt").with_timestamp(modified), b"x")
        .unwrap();
    let archive = open(archive.finish().unwrap().into_inner());

    let dir = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new().preserve(PreserveMetadata::modification_time_only());
    let path = archive
        .extract_entry(archive.entry("dated.txt").unwrap(), dir.path(), &options)
        .unwrap();

    let expected = filetime::FileTime::from_system_time(modified.to_system_time().unwrap());
    let actual = filetime::FileTime::from_last_modification_time(&fs::metadata(&path).unwrap());
    assert_eq!(actual.unix_seconds(), expected.unix_seconds());
}

#[cfg(unix)]
#[test]
fn test_preserve_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let entry = Entry::new("script.sh").with_external_attr(0o100750 << 16);
    let mut archive = ZipArchive::create(std::io::Cursor::new(Vec::new())).unwrap();
    archive.write_entry_bytes(entry, b"#!/bin/sh\n").unwrap();
    let archive = open(archive.finish().unwrap().into_inner());

    let dir = tempfile::tempdir().unwrap();
    let options = ExtractOptions::new().preserve(PreserveMetadata::all());
    let result = archive.extract_all(dir.path(), &options).unwrap();
    assert!(result.is_ok());
    let mode = fs::metadata(dir.path().join("script.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o750);
}
