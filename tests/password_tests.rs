//! Tests for ZipCrypto-encrypted entries.

mod common;

use std::io::Read;

use common::{RawEntry, build_raw_archive, open};
use zipcore::crypto::{HEADER_SIZE, ZipCryptoKeys, check_byte};
use zipcore::format::flags;
use zipcore::{Error, ExtractOptions};

const PASSWORD: &[u8] = b"correct horse";
const SECRET: &[u8] = b"the secret payload";

fn encrypted_archive() -> Vec<u8> {
    build_raw_archive(&[
        RawEntry::stored("plain.txt", b"not encrypted"),
        RawEntry::encrypted("secret.txt", SECRET, PASSWORD),
    ])
}

/// A password that decrypts the header of `secret.txt` to a wrong check byte.
fn wrong_password(bytes: &[u8]) -> Vec<u8> {
    let archive = open(bytes.to_vec());
    let entry = archive.entry("secret.txt").unwrap();
    let start = (entry.header_offset + 30 + entry.name.len() as u64) as usize;
    let (time, _) = entry.modified.to_dos();
    let expected = check_byte(entry.flags, entry.crc32, time);
    (0..)
        .map(|i| format!("wrong{i}").into_bytes())
        .find(|candidate| {
            let mut header = bytes[start..start + HEADER_SIZE].to_vec();
            ZipCryptoKeys::new(candidate).decrypt_in_place(&mut header);
            header[HEADER_SIZE - 1] != expected
        })
        .unwrap()
}

#[test]
fn test_encrypted_entry_is_flagged() {
    let archive = open(encrypted_archive());
    assert!(archive.entry("secret.txt").unwrap().is_encrypted());
    assert!(!archive.entry("plain.txt").unwrap().is_encrypted());
}

#[test]
fn test_password_required() {
    let archive = open(encrypted_archive());
    match archive.read("secret.txt") {
        Err(Error::PasswordRequired { entry_name }) => assert_eq!(entry_name, "secret.txt"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(archive.read("plain.txt").unwrap(), b"not encrypted");
}

#[test]
fn test_empty_password_counts_as_missing() {
    let archive = open(encrypted_archive());
    let err = archive
        .by_name_with_password("secret.txt", Some(&b""[..]))
        .unwrap_err();
    assert!(matches!(err, Error::PasswordRequired { .. }));
}

#[test]
fn test_wrong_password() {
    let bytes = encrypted_archive();
    let wrong = wrong_password(&bytes);
    let archive = open(bytes);
    let err = archive
        .by_name_with_password("secret.txt", Some(wrong.as_slice()))
        .unwrap_err();
    assert!(matches!(err, Error::WrongPassword { ref entry_name } if entry_name == "secret.txt"));
    assert!(err.is_encryption_error());
}

#[test]
fn test_explicit_password() {
    let archive = open(encrypted_archive());
    let mut reader = archive
        .by_name_with_password("secret.txt", Some(PASSWORD))
        .unwrap();
    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();
    assert_eq!(out, SECRET);
}

#[test]
fn test_archive_password() {
    let mut archive = open(encrypted_archive());
    archive.set_password(PASSWORD);
    assert_eq!(archive.read("secret.txt").unwrap(), SECRET);
    // Plain entries ignore the password.
    assert_eq!(archive.read("plain.txt").unwrap(), b"not encrypted");
    assert_eq!(archive.test().unwrap(), None);
}

#[test]
fn test_explicit_password_overrides_archive_password() {
    let bytes = encrypted_archive();
    let wrong = wrong_password(&bytes);
    let mut archive = open(bytes);
    archive.set_password(wrong.as_slice());
    assert!(matches!(
        archive.read("secret.txt"),
        Err(Error::WrongPassword { .. })
    ));
    let mut out = Vec::new();
    archive
        .by_name_with_password("secret.txt", Some(PASSWORD))
        .unwrap()
        .read_to_end(&mut out)
        .unwrap();
    assert_eq!(out, SECRET);
}

#[test]
fn test_check_byte_from_time_with_data_descriptor() {
    let entry = RawEntry {
        flags: flags::ENCRYPTED | flags::DATA_DESCRIPTOR,
        ..RawEntry::encrypted("dd.txt", SECRET, PASSWORD)
    };
    let mut archive = open(build_raw_archive(&[entry]));
    assert!(archive.entry("dd.txt").unwrap().has_data_descriptor());
    archive.set_password(PASSWORD);
    assert_eq!(archive.read("dd.txt").unwrap(), SECRET);
}

#[test]
fn test_corrupt_ciphertext_fails_crc() {
    let mut bytes = encrypted_archive();
    let archive = open(bytes.clone());
    let entry = archive.entry("secret.txt").unwrap();
    let data_start = entry.header_offset as usize + 30 + entry.name.len() + HEADER_SIZE;
    drop(archive);
    bytes[data_start + 2] ^= 0x10;

    let mut archive = open(bytes);
    archive.set_password(PASSWORD);
    assert!(matches!(
        archive.read("secret.txt"),
        Err(Error::CrcMismatch { .. })
    ));
}

#[test]
fn test_test_without_password_reports_error() {
    let archive = open(encrypted_archive());
    assert!(matches!(
        archive.test(),
        Err(Error::PasswordRequired { .. })
    ));
}

#[test]
fn test_extract_with_password() {
    let archive = open(encrypted_archive());
    let dir = tempfile::tempdir().unwrap();

    let result = archive
        .extract_all(dir.path(), &ExtractOptions::default())
        .unwrap();
    assert_eq!(result.entries_extracted, 1);
    assert_eq!(result.entries_failed, 1);
    assert_eq!(result.failures[0].0, "secret.txt");

    let options = ExtractOptions::new().password("correct horse");
    let result = archive.extract_all(dir.path(), &options).unwrap();
    assert!(result.is_ok());
    assert_eq!(
        std::fs::read(dir.path().join("secret.txt")).unwrap(),
        SECRET
    );
}
