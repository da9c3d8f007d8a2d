//! SimHash fingerprints for document similarity.
//!
//! SimHash is a locality-sensitive hashing technique: documents with
//! mostly-shared content produce fingerprints with a small Hamming
//! distance, so downstream tooling can find near-duplicates cheaply.

use smelter_core::hashing::hash64;
use std::collections::HashMap;

/// Width of the fingerprint in bits.
pub const FINGERPRINT_BITS: usize = 64;

/// Default character shingle width for feature extraction.
pub const DEFAULT_SHINGLE_WIDTH: usize = 4;

/// SimHash fingerprint generator.
///
/// Each paragraph is decomposed into character shingles; every shingle
/// occurrence votes its hash bits up (bit set) or down (bit clear) and
/// the fingerprint keeps the winning bit at each position.
#[derive(Clone, Debug)]
pub struct SimHasher {
    /// Character shingle width.
    shingle_width: usize,
}

impl SimHasher {
    /// Create a new SimHasher with the default shingle width.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shingle_width: DEFAULT_SHINGLE_WIDTH,
        }
    }

    /// Set the character shingle width.
    #[must_use]
    pub fn with_shingle_width(mut self, shingle_width: usize) -> Self {
        self.shingle_width = shingle_width.max(1);
        self
    }

    /// Get the character shingle width.
    #[must_use]
    pub fn shingle_width(&self) -> usize {
        self.shingle_width
    }

    /// Compute the 64-bit fingerprint of an ordered paragraph sequence.
    ///
    /// Deterministic: the same paragraphs always produce the same value,
    /// across runs and platforms. An empty sequence (or one with only
    /// empty paragraphs) maps to 0.
    #[must_use]
    pub fn fingerprint<S: AsRef<str>>(&self, paragraphs: &[S]) -> u64 {
        let mut weights: HashMap<u64, i64> = HashMap::new();
        for paragraph in paragraphs {
            for hash in self.shingle_hashes(paragraph.as_ref()) {
                *weights.entry(hash).or_insert(0) += 1;
            }
        }

        if weights.is_empty() {
            return 0;
        }

        let mut sums = [0i64; FINGERPRINT_BITS];
        for (&hash, &weight) in &weights {
            for (bit, sum) in sums.iter_mut().enumerate() {
                if hash >> bit & 1 == 1 {
                    *sum += weight;
                } else {
                    *sum -= weight;
                }
            }
        }

        let mut fingerprint = 0u64;
        for (bit, &sum) in sums.iter().enumerate() {
            if sum > 0 {
                fingerprint |= 1 << bit;
            }
        }
        fingerprint
    }

    /// Compute the fingerprint of a single block of text.
    #[must_use]
    pub fn fingerprint_text(&self, text: &str) -> u64 {
        self.fingerprint(&[text])
    }

    /// Hash the character shingles of one paragraph, one hash per occurrence.
    ///
    /// Character shingles (rather than whitespace tokens) keep CJK text,
    /// which has no word separators, producing enough features per
    /// paragraph for locality sensitivity to hold.
    #[must_use]
    pub fn shingle_hashes(&self, text: &str) -> Vec<u64> {
        let chars: Vec<char> = text.chars().collect();

        if chars.len() < self.shingle_width {
            // Shorter than one shingle: the whole paragraph is the feature
            if chars.is_empty() {
                return Vec::new();
            }
            return vec![hash64(text.as_bytes())];
        }

        (0..=chars.len() - self.shingle_width)
            .map(|i| {
                let shingle: String = chars[i..i + self.shingle_width].iter().collect();
                hash64(shingle.as_bytes())
            })
            .collect()
    }
}

impl Default for SimHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of differing bits between two fingerprints.
#[must_use]
pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}
