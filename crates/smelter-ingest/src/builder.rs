//! Assembles canonical documents from raw lines.

use std::collections::HashSet;

use chrono::Local;
use smelter_core::hashing::{HashFunction, Md5Hasher};
use smelter_core::{Result, SmelterError};

use crate::document::{Document, Paragraph};
use crate::simhash::SimHasher;

/// Builds [`Document`] records: filters blank lines, hashes and marks
/// repeated paragraphs, and fingerprints the retained content.
///
/// The builder is cheap to construct, reusable, and shareable across
/// converter workers by reference.
pub struct DocumentBuilder {
    hasher: Md5Hasher,
    fingerprinter: SimHasher,
    /// Store lines trimmed of surrounding whitespace.
    trim: bool,
}

impl DocumentBuilder {
    /// Create a builder with trimming enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Md5Hasher::new(),
            fingerprinter: SimHasher::new(),
            trim: true,
        }
    }

    /// Enable or disable per-line trimming (default on). Blank-line
    /// filtering always trims for the emptiness check regardless.
    #[must_use]
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Set the fingerprint shingle width.
    #[must_use]
    pub fn with_shingle_width(mut self, width: usize) -> Self {
        self.fingerprinter = self.fingerprinter.with_shingle_width(width);
        self
    }

    /// Build a document from a pre-split line sequence.
    ///
    /// The split is authoritative: each element is one candidate
    /// paragraph, and elements that are empty after trimming are dropped
    /// while keeping the original 1-based numbering of the survivors.
    /// Fails only when `text_id` is empty.
    pub fn build<S: AsRef<str>>(
        &self,
        text_id: &str,
        lines: &[S],
        create_time: Option<&str>,
    ) -> Result<Document> {
        let line_refs: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        // Byte length of the lines rejoined with '\n', which reconstructs
        // the unsplit input exactly
        let size_bytes = line_refs.iter().map(|l| l.len() as u64).sum::<u64>()
            + line_refs.len().saturating_sub(1) as u64;
        self.assemble(text_id, &line_refs, create_time, size_bytes)
    }

    /// Build a document from a raw text block, splitting on `'\n'`.
    pub fn build_text(
        &self,
        text_id: &str,
        text: &str,
        create_time: Option<&str>,
    ) -> Result<Document> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.assemble(text_id, &lines, create_time, text.len() as u64)
    }

    fn assemble(
        &self,
        text_id: &str,
        lines: &[&str],
        create_time: Option<&str>,
        size_bytes: u64,
    ) -> Result<Document> {
        if text_id.is_empty() {
            return Err(SmelterError::InvalidInput("empty text_id".to_string()));
        }

        let create_time = match create_time {
            Some(t) => t.to_string(),
            None => Local::now().format("%Y%m%d").to_string(),
        };

        let mut paragraphs = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut longest: i64 = -1;

        for (idx, &raw) in lines.iter().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let stored = if self.trim { raw.trim() } else { raw };

            // Length bookkeeping uses the line as provided, pre-trim
            longest = longest.max(raw.chars().count() as i64);

            let content_hash = self.hasher.hash_hex(stored.as_bytes());
            let repeated = !seen.insert(content_hash.clone());

            let mut paragraph = Paragraph::new(idx + 1, stored.to_string(), content_hash);
            paragraph.repeated = repeated;
            paragraphs.push(paragraph);
        }

        // Fingerprint the retained contents in retained order, before the
        // document is published; it is never recomputed
        let contents: Vec<&str> = paragraphs.iter().map(|p| p.content.as_str()).collect();
        let fingerprint = self.fingerprinter.fingerprint(&contents);

        Ok(Document {
            id: text_id.to_string(),
            to_check: false,
            repeated: false,
            size_bytes,
            longest_paragraph_len: longest,
            paragraph_count: paragraphs.len(),
            unique_paragraph_count: seen.len(),
            low_quality_count: 0,
            paragraphs,
            create_time,
            extension: String::new(),
            fingerprint,
        })
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
