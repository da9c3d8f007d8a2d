//! Hashing functions.

use md5::{Digest, Md5};

/// Trait for hash functions.
pub trait HashFunction: Send + Sync {
    /// Hash data and return raw bytes.
    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// Hash data and return hex string.
    fn hash_hex(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }

    /// Hash data and return u64 (for use in hash maps).
    fn hash_u64(&self, data: &[u8]) -> u64;
}

/// MD5 hasher - the 128-bit content digest used for paragraph dedup.
///
/// The hex form of this digest is a wire field, so the algorithm must
/// stay stable across releases.
pub struct Md5Hasher;

impl Md5Hasher {
    /// Create a new MD5 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for Md5Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for Md5Hasher {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        Md5::digest(data).to_vec()
    }

    fn hash_u64(&self, data: &[u8]) -> u64 {
        let digest = Md5::digest(data);
        u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ])
    }
}

/// XXHash3 hasher - extremely fast, good for checksums.
pub struct XxHash3;

impl XxHash3 {
    /// Create a new XXHash3 hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for XxHash3 {
    fn default() -> Self {
        Self::new()
    }
}

impl HashFunction for XxHash3 {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        xxhash_rust::xxh3::xxh3_128(data).to_le_bytes().to_vec()
    }

    fn hash_u64(&self, data: &[u8]) -> u64 {
        xxhash_rust::xxh3::xxh3_64(data)
    }
}

/// Fast 64-bit hash for fingerprint features.
#[inline]
pub fn hash64(data: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(data)
}
