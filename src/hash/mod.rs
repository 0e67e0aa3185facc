//! Content hashing for revision strings.
//!
//! The renderer only talks to the [`Hasher`] trait so tests can substitute a
//! stub returning a fixed string. [`DigestHasher`] is the production
//! implementation, with the algorithm chosen per deployment.

mod file;

pub use file::FileHashCache;

use serde::{Deserialize, Serialize};

/// Digest over the exact bytes of a rendered bundle.
pub trait Hasher: Send + Sync {
    /// Hex digest of `bytes`.
    fn hash(&self, bytes: &[u8]) -> String;
}

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 128-bit MD5, 32 hex chars.
    #[default]
    Md5,
    /// 256-bit blake3, 64 hex chars.
    Blake3,
}

impl HashAlgorithm {
    /// Length of the hex digest produced by this algorithm.
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Blake3 => 64,
        }
    }
}

/// Hasher backed by a standard digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestHasher {
    algorithm: HashAlgorithm,
}

impl DigestHasher {
    pub const fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }
}

impl Hasher for DigestHasher {
    fn hash(&self, bytes: &[u8]) -> String {
        match self.algorithm {
            HashAlgorithm::Md5 => hex::encode(md5::compute(bytes).0),
            HashAlgorithm::Blake3 => hex::encode(blake3::hash(bytes).as_bytes()),
        }
    }
}

/// Short blake3 fingerprint used for cache keys and lock names.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(value: &T) -> String {
    blake3::hash(value.as_ref()).to_hex()[..16].to_string()
}
