//! Traditional PKWARE encryption (ZipCrypto), decryption side.
//!
//! Three 32-bit keys are initialized from the password and updated with
//! every plaintext byte. Each ciphertext byte is XORed with a stream byte
//! derived from the third key. A 12-byte header precedes the data; its last
//! byte must match a check value taken from the entry's CRC or DOS time.

mod password;

use std::io::{self, Read};

pub use password::Password;

/// Length of the encryption header preceding the entry data.
pub const HEADER_SIZE: usize = 12;

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = crc_table();

#[inline]
fn crc32_byte(crc: u32, b: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ b as u32) & 0xff) as usize]
}

/// The ZipCrypto key state.
#[derive(Clone)]
pub struct ZipCryptoKeys {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl std::fmt::Debug for ZipCryptoKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCryptoKeys").finish_non_exhaustive()
    }
}

impl ZipCryptoKeys {
    /// Initializes the keys from a password.
    pub fn new(password: &[u8]) -> Self {
        let mut keys = Self {
            key0: 305_419_896,
            key1: 591_751_049,
            key2: 878_082_192,
        };
        for &b in password {
            keys.update(b);
        }
        keys
    }

    /// Mixes one plaintext byte into the keys.
    pub fn update(&mut self, b: u8) {
        self.key0 = crc32_byte(self.key0, b);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xff)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        self.key2 = crc32_byte(self.key2, (self.key1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let t = self.key2 | 2;
        (t.wrapping_mul(t ^ 1) >> 8) as u8
    }

    /// Decrypts one byte and advances the keys.
    pub fn decrypt_byte(&mut self, c: u8) -> u8 {
        let p = c ^ self.stream_byte();
        self.update(p);
        p
    }

    /// Encrypts one byte and advances the keys.
    ///
    /// Writing encrypted entries is not supported; this exists to build
    /// encrypted fixtures.
    #[doc(hidden)]
    pub fn encrypt_byte(&mut self, p: u8) -> u8 {
        let c = p ^ self.stream_byte();
        self.update(p);
        c
    }

    /// Decrypts `buf` in place.
    pub fn decrypt_in_place(&mut self, buf: &mut [u8]) {
        for b in buf {
            *b = self.decrypt_byte(*b);
        }
    }
}

/// The byte the decrypted header must end with.
///
/// Entries with a data descriptor use the high byte of the DOS time,
/// others the high byte of the CRC.
pub fn check_byte(flags: u16, crc32: u32, dos_time: u16) -> u8 {
    if flags & crate::format::flags::DATA_DESCRIPTOR != 0 {
        (dos_time >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    }
}

/// A reader that decrypts ZipCrypto data on the fly.
pub struct ZipCryptoReader<R> {
    inner: R,
    keys: ZipCryptoKeys,
}

impl<R> std::fmt::Debug for ZipCryptoReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCryptoReader").finish_non_exhaustive()
    }
}

impl<R: Read> ZipCryptoReader<R> {
    /// Reads and decrypts the 12-byte header, returning the reader and the
    /// last decrypted header byte.
    pub fn new(mut inner: R, password: &[u8]) -> io::Result<(Self, u8)> {
        let mut keys = ZipCryptoKeys::new(password);
        let mut header = [0u8; HEADER_SIZE];
        inner.read_exact(&mut header)?;
        keys.decrypt_in_place(&mut header);
        Ok((Self { inner, keys }, header[HEADER_SIZE - 1]))
    }
}

impl<R: Read> Read for ZipCryptoReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.keys.decrypt_in_place(&mut buf[..n]);
        Ok(n)
    }
}
