//! CRC-32 of entry data.
//!
//! ZIP records a CRC-32 (IEEE 802.3 polynomial) of every entry's
//! uncompressed data. Entry readers verify it once the last byte has been
//! produced and entry writers accumulate it while data streams through.
//!
//! # Example
//!
//! ```rust
//! use zipcore::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
//! assert_eq!(crc.finalize(), 0xEC4A_C3D0);
//! ```

/// Running CRC-32 over entry data.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.finalize())
            .field("bytes", &self.hasher.amount())
            .finish()
    }
}

impl Crc32 {
    /// Starts a new checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the CRC-32 of a single slice.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }

    /// Feeds more data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// The CRC-32 of everything fed so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Number of bytes fed so far.
    pub fn len(&self) -> u64 {
        self.hasher.amount()
    }

    /// Returns true if nothing has been fed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts over, as if freshly created.
    pub fn reset(&mut self) {
        self.hasher.reset();
    }
}
