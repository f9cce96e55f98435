//! Write/read round trips through the public API.

mod common;

use std::io::{BufRead, Cursor, Read, Seek, SeekFrom, Write};

use common::{compressible, create_archive, create_archive_with_options, incompressible, open};
use zipcore::format::records::EndOfCentralDirectory;
use zipcore::{ArchiveOptions, CompressionMethod, DosDateTime, Entry, Error, Mode, ZipArchive};

#[test]
fn test_two_entries_with_directory() {
    let options = ArchiveOptions::new().compression(CompressionMethod::Deflated);
    let mut archive = ZipArchive::create(Cursor::new(Vec::new()))
        .unwrap()
        .with_options(options);
    archive.write_bytes("a.txt", b"hello").unwrap();
    archive.write_bytes("dir/b.txt", &compressible(10_000)).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let eocd = EndOfCentralDirectory::parse(&bytes, bytes.len() as u64 - 22).unwrap();
    assert_eq!(eocd.entries_this_disk, 2);
    assert_eq!(eocd.entries_total, 2);
    assert_eq!(eocd.comment_len, 0);

    let archive = open(bytes);
    assert_eq!(archive.mode(), Mode::Read);
    assert_eq!(archive.names().collect::<Vec<_>>(), ["a.txt", "dir/b.txt"]);
    assert_eq!(archive.read("a.txt").unwrap(), b"hello");
    assert_eq!(archive.read("dir/b.txt").unwrap(), compressible(10_000));

    let b = archive.entry("dir/b.txt").unwrap();
    assert_eq!(b.compression().unwrap(), CompressionMethod::Deflated);
    assert!(b.compressed_size < b.uncompressed_size);
    assert_eq!(archive.test().unwrap(), None);
}

#[test]
fn test_every_supported_method() {
    let small = b"zip".to_vec();
    let text = compressible(200_000);
    let noise = incompressible(50_000, 7);
    for method in common::supported_methods() {
        let options = ArchiveOptions::new().compression(method);
        let bytes = create_archive_with_options(
            options,
            &[("empty", b""), ("small", &small), ("text", &text), ("noise", &noise)],
        )
        .unwrap();
        common::verify_archive_contents(
            &bytes,
            &[("empty", b""), ("small", &small), ("text", &text), ("noise", &noise)],
        );
        let archive = open(bytes);
        for entry in archive.entries() {
            assert_eq!(entry.compression().unwrap(), method, "{method} {}", entry.name);
        }
    }
}

#[test]
fn test_compression_levels() {
    let data = compressible(100_000);
    for level in [0, 1, 9] {
        let options = ArchiveOptions::new()
            .compression(CompressionMethod::Deflated)
            .level(level)
            .unwrap();
        let bytes = create_archive_with_options(options, &[("data", &data)]).unwrap();
        assert_eq!(open(bytes).read("data").unwrap(), data);
    }
    assert!(matches!(
        ArchiveOptions::new().level(10),
        Err(Error::InvalidCompressionLevel { level: 10 })
    ));
}

#[test]
fn test_empty_archive() {
    let bytes = create_archive(&[]).unwrap();
    assert_eq!(bytes.len(), 22);
    let archive = open(bytes);
    assert!(archive.is_empty());
    assert_eq!(archive.test().unwrap(), None);
}

#[test]
fn test_duplicate_names_last_wins() {
    let bytes = create_archive(&[("same", b"first"), ("same", b"second")]).unwrap();
    let archive = open(bytes);
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.names().collect::<Vec<_>>(), ["same", "same"]);
    assert_eq!(archive.read("same").unwrap(), b"second");
    let first = &archive.entries()[0];
    let mut data = Vec::new();
    archive
        .by_entry(first)
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    assert_eq!(data, b"first");
}

#[test]
fn test_archive_comment() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_bytes("a", b"1").unwrap();
    archive.set_comment("release build");
    let bytes = archive.finish().unwrap().into_inner();
    assert!(bytes.ends_with(b"release build"));
    assert_eq!(open(bytes).comment(), b"release build");
}

#[test]
fn test_overlong_comment_truncated() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.set_comment(vec![b'c'; 70_000]);
    assert_eq!(archive.comment().len(), 65_535);
    let bytes = archive.finish().unwrap().into_inner();
    assert_eq!(open(bytes).comment().len(), 65_535);
}

#[test]
fn test_entry_metadata_preserved() {
    let modified = DosDateTime::new(2024, 5, 1, 12, 30, 10).unwrap();
    let entry = Entry::new("meta.bin")
        .with_timestamp(modified)
        .with_method(CompressionMethod::Deflated)
        .with_external_attr(0o100644 << 16)
        .with_comment("entry comment");

    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_entry_bytes(entry, b"payload").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    let entry = archive.entry("meta.bin").unwrap();
    assert_eq!(entry.modified, modified);
    assert_eq!(entry.unix_mode(), Some(0o100644));
    assert_eq!(entry.comment, b"entry comment");
    assert_eq!(entry.uncompressed_size, 7);
    assert!(!entry.is_dir());
}

#[test]
fn test_mkdir() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.mkdir("docs").unwrap();
    archive.mkdir_with_mode("private/", 0o700).unwrap();
    assert!(matches!(
        archive.mkdir_entry(Entry::new("file.txt")),
        Err(Error::InvalidArgument(_))
    ));
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    let docs = archive.entry("docs/").unwrap();
    assert!(docs.is_dir());
    assert_eq!(docs.unix_mode(), Some(0o40777));
    assert_eq!(docs.uncompressed_size, 0);
    assert_eq!(archive.entry("private/").unwrap().unix_mode(), Some(0o40700));
    assert_eq!(archive.read("docs/").unwrap(), b"");
}

#[test]
fn test_write_path() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, b"from disk").unwrap();
    let sub = dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();

    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_path(&file, Some("notes.txt")).unwrap();
    archive.write_path(&sub, Some("sub")).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    assert_eq!(archive.read("notes.txt").unwrap(), b"from disk");
    assert!(archive.entry("sub/").unwrap().is_dir());
}

#[test]
fn test_write_path_arcname_stays_below_root() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, b"from disk").unwrap();

    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_path(&file, Some("../../notes.txt")).unwrap();
    archive.write_path(&file, Some("a/../../b/./c.txt")).unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    assert_eq!(archive.names().collect::<Vec<_>>(), ["notes.txt", "b/c.txt"]);
    assert_eq!(archive.read("b/c.txt").unwrap(), b"from disk");
}

#[test]
fn test_create_path_and_open_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.zip");

    let mut archive = ZipArchive::create_path(&path).unwrap();
    archive.write_bytes("x", b"on disk").unwrap();
    archive.close().unwrap();
    assert!(archive.is_closed());

    assert!(zipcore::is_zip_path(&path));
    let archive = ZipArchive::open_path(&path).unwrap();
    assert_eq!(archive.read("x").unwrap(), b"on disk");
}

#[test]
fn test_create_new_path_refuses_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exists.zip");
    std::fs::write(&path, b"").unwrap();
    assert!(matches!(
        ZipArchive::create_new_path(&path),
        Err(Error::Io(ref e)) if e.kind() == std::io::ErrorKind::AlreadyExists
    ));

    let fresh = dir.path().join("fresh.zip");
    let mut archive = ZipArchive::create_new_path(&fresh).unwrap();
    assert_eq!(archive.mode(), Mode::Exclusive);
    archive.write_bytes("a", b"b").unwrap();
    archive.close().unwrap();
    assert_eq!(ZipArchive::open_path(&fresh).unwrap().read("a").unwrap(), b"b");
}

#[test]
fn test_drop_writes_central_directory() {
    let mut buffer = Vec::new();
    {
        let mut archive = ZipArchive::create(Cursor::new(&mut buffer)).unwrap();
        archive.write_bytes("dropped", b"still here").unwrap();
    }
    assert_eq!(open(buffer).read("dropped").unwrap(), b"still here");
}

#[test]
fn test_entry_writer_streaming_input() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new()))
        .unwrap()
        .with_options(ArchiveOptions::new().compression(CompressionMethod::Deflated));
    let entry = Entry::new("chunks.txt").with_method(CompressionMethod::Deflated);
    let mut writer = archive.start_entry(entry, false).unwrap();
    for i in 0..1000 {
        writeln!(writer, "line {i}").unwrap();
    }
    assert!(writer.bytes_written() > 0);
    writer.finish().unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let archive = open(bytes);
    let reader = archive.by_name("chunks.txt").unwrap();
    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    assert_eq!(lines.len(), 1000);
    assert_eq!(lines[0], "line 0");
    assert_eq!(lines[999], "line 999");
}

#[test]
fn test_reader_seek_and_peek() {
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    for method in common::supported_methods() {
        let options = ArchiveOptions::new().compression(method);
        let bytes = create_archive_with_options(options, &[("seek", &data)]).unwrap();
        let archive = open(bytes);
        let mut reader = archive.by_name("seek").unwrap();

        assert_eq!(reader.peek(4).unwrap(), &data[..4]);
        assert_eq!(reader.stream_position().unwrap(), 0);

        reader.seek(SeekFrom::Start(30_000)).unwrap();
        let mut buf = [0u8; 16];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, data[30_000..30_016]);

        reader.seek(SeekFrom::Start(100)).unwrap();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, data[100..116]);

        reader.seek(SeekFrom::Current(-8)).unwrap();
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, data[108..124]);

        assert_eq!(reader.seek(SeekFrom::End(10)).unwrap(), data.len() as u64);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert!(reader.seek(SeekFrom::Current(-(data.len() as i64) - 1)).is_err());
    }
}

#[test]
fn test_print_dir() {
    let entry = Entry::new("listed.txt")
        .with_timestamp(DosDateTime::new(2024, 5, 1, 12, 30, 0).unwrap());
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_entry_bytes(entry, b"hello").unwrap();
    let bytes = archive.finish().unwrap().into_inner();

    let mut out = Vec::new();
    open(bytes).print_dir(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("File Name"));
    assert!(lines[1].starts_with("listed.txt"));
    assert!(lines[1].contains("2024-05-01 12:30:00"));
    assert!(lines[1].ends_with(" 5"));
}

#[test]
fn test_reading_requires_readable_mode() {
    let mut archive = ZipArchive::create(Cursor::new(Vec::new())).unwrap();
    archive.write_bytes("a", b"1").unwrap();
    assert!(matches!(
        archive.read("a"),
        Err(Error::InvalidMode {
            mode: Mode::Write,
            ..
        })
    ));
}

#[test]
fn test_writing_requires_writable_mode() {
    let bytes = create_archive(&[("a", b"1")]).unwrap();
    let mut archive = open(bytes);
    assert!(matches!(
        archive.write_bytes("b", b"2"),
        Err(Error::InvalidMode {
            mode: Mode::Read,
            ..
        })
    ));
    assert!(matches!(archive.mkdir("d"), Err(Error::InvalidMode { .. })));
}

#[test]
fn test_closed_archive() {
    let bytes = create_archive(&[("a", b"contents")]).unwrap();
    let mut archive = open(bytes);
    let mut reader = archive.by_name("a").unwrap();
    archive.close().unwrap();
    archive.close().unwrap();

    assert!(matches!(archive.read("a"), Err(Error::Closed)));
    let err = reader.read(&mut [0u8; 4]).unwrap_err();
    assert!(matches!(Error::from_io(err), Error::Closed));
}

#[test]
fn test_missing_entry() {
    let archive = open(create_archive(&[("a", b"1")]).unwrap());
    match archive.read("b") {
        Err(Error::EntryNotFound { path }) => assert_eq!(path, "b"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_unicode_names() {
    let bytes = create_archive(&[("données/été.txt", b"utf8"), ("日本語", b"cjk")]).unwrap();
    let archive = open(bytes);
    assert_eq!(archive.read("données/été.txt").unwrap(), b"utf8");
    assert_eq!(archive.read("日本語").unwrap(), b"cjk");
}

#[test]
fn test_leading_slash_names_normalized() {
    let bytes = create_archive(&[("/abs/file.txt", b"x")]).unwrap();
    let archive = open(bytes);
    assert_eq!(archive.names().collect::<Vec<_>>(), ["abs/file.txt"]);
    assert_eq!(archive.read("abs/file.txt").unwrap(), b"x");
}

#[test]
fn test_archive_after_prefix_in_writer() {
    let mut cursor = Cursor::new(Vec::new());
    cursor.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
    let mut archive = ZipArchive::create(cursor).unwrap();
    archive.write_bytes("payload", b"after prefix").unwrap();
    let bytes = archive.finish().unwrap().into_inner();
    assert!(bytes.starts_with(b"#!/bin/sh"));
    assert_eq!(open(bytes).read("payload").unwrap(), b"after prefix");
}
