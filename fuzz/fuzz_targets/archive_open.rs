//! Fuzz target for ZipArchive::open with arbitrary byte input.
//!
//! Exercises the end-record search, the central directory parser and the
//! entry readers with malformed or adversarial input, looking for panics,
//! hangs or runaway allocations.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::{Cursor, Read};

fuzz_target!(|data: &[u8]| {
    let Ok(archive) = zipcore::ZipArchive::open(Cursor::new(data)) else {
        return;
    };
    let entries: Vec<_> = archive.entries().to_vec();
    for entry in &entries {
        let _ = entry.is_dir();
        let _ = archive.data_descriptor(&entry.name);
        if let Ok(mut reader) = archive.by_entry_with_password(entry, Some(b"fuzz".as_slice())) {
            // Cap output per entry.
            let mut sink = Vec::new();
            let _ = reader.by_ref().take(1 << 20).read_to_end(&mut sink);
        }
    }
    let _ = archive.test();
});
