//! Password handling for ZipCrypto.

use zeroize::Zeroizing;

/// A password for decrypting ZipCrypto entries.
///
/// ZipCrypto keys are derived from raw bytes, so the password is stored as
/// bytes and wiped from memory when dropped.
#[derive(Clone)]
pub struct Password {
    inner: Zeroizing<Vec<u8>>,
}

impl Password {
    /// Creates a new password from raw bytes or a string.
    pub fn new<B: AsRef<[u8]>>(password: B) -> Self {
        Self {
            inner: Zeroizing::new(password.as_ref().to_vec()),
        }
    }

    /// Returns the password bytes used for key initialization.
    pub fn as_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the length of the password in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&[u8]> for Password {
    fn from(b: &[u8]) -> Self {
        Self::new(b)
    }
}
