use serde::{Deserialize, Serialize};
use std::fmt;

/// A content-derived BLAKE3 digest.
///
/// Identical fingerprints mean the hashed inputs were identical, so anything
/// derived from them can be reused without recomputation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub const ZERO: Fingerprint = Fingerprint([0; 32]);

    /// Hash an arbitrary byte slice.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(bytes.as_ref()).as_bytes())
    }

    #[inline]
    pub const fn from_raw(raw: [u8; 32]) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable.
        write!(f, "Fingerprint(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// Incremental fingerprint computation over structured input.
///
/// Variable-length fields are length-prefixed so that `("ab", "c")` and
/// `("a", "bc")` hash differently.
#[derive(Clone, Default)]
pub struct FingerprintBuilder {
    hasher: blake3::Hasher,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.hasher.update(&[value]);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(&value.to_le_bytes());
        self
    }

    pub fn fingerprint(&mut self, value: &Fingerprint) -> &mut Self {
        self.hasher.update(value.as_bytes());
        self
    }

    pub fn finish(&self) -> Fingerprint {
        Fingerprint(*self.hasher.finalize().as_bytes())
    }
}
