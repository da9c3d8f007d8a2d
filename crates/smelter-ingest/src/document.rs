//! Canonical corpus record types.
//!
//! The wire format uses stable Chinese JSON keys consumed by downstream
//! corpus tooling; in-code names stay English via serde renames. Field
//! declaration order matches the wire order.

use serde::{Deserialize, Serialize};

/// One retained paragraph of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    /// 1-based line number in the original pre-filter line sequence.
    #[serde(rename = "行号")]
    pub line_no: usize,
    /// True iff an earlier paragraph in the same document has the same hash.
    #[serde(rename = "是否重复", default)]
    pub repeated: bool,
    /// Reserved for cross-file dedup; always false here.
    #[serde(rename = "是否跨文件重复", default)]
    pub repeated_across_files: bool,
    /// Paragraph text as stored (trimmed when trimming is enabled).
    #[serde(rename = "内容")]
    pub content: String,
    /// Opaque source-specific metadata, serialized form.
    #[serde(rename = "扩展字段", default)]
    pub extension: String,
    /// Lowercase hex of the 128-bit content digest.
    #[serde(rename = "md5")]
    pub content_hash: String,
}

impl Paragraph {
    /// Create a paragraph with dedup flags cleared.
    #[must_use]
    pub fn new(line_no: usize, content: String, content_hash: String) -> Self {
        Self {
            line_no,
            repeated: false,
            repeated_across_files: false,
            content,
            extension: String::new(),
            content_hash,
        }
    }
}

/// Canonical corpus record for one source item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Source identifier, usually a file name.
    #[serde(rename = "文件名")]
    pub id: String,
    /// Flag for downstream quality review queues.
    #[serde(rename = "是否待查文件", default)]
    pub to_check: bool,
    /// Whole-file duplicate flag, set by downstream cross-file dedup.
    #[serde(rename = "是否重复文件", default)]
    pub repeated: bool,
    /// Byte length of the original unsplit text.
    #[serde(rename = "文件大小", default)]
    pub size_bytes: u64,
    /// Longest untrimmed line length in chars; -1 when nothing survived.
    #[serde(rename = "最长段落长度", default)]
    pub longest_paragraph_len: i64,
    /// Number of retained paragraphs.
    #[serde(rename = "段落数", default)]
    pub paragraph_count: usize,
    /// Number of distinct paragraph hashes.
    #[serde(rename = "去重段落数", default)]
    pub unique_paragraph_count: usize,
    /// Low-quality paragraph count; defaulted, quality scoring lives elsewhere.
    #[serde(rename = "低质量段落数", default)]
    pub low_quality_count: usize,
    /// Retained paragraphs in original order.
    #[serde(rename = "段落")]
    pub paragraphs: Vec<Paragraph>,
    /// Creation date, YYYYMMDD.
    #[serde(rename = "时间")]
    pub create_time: String,
    /// Opaque source-specific metadata, serialized form.
    #[serde(rename = "扩展字段", default)]
    pub extension: String,
    /// 64-bit similarity fingerprint over the retained paragraph contents.
    #[serde(rename = "simhash", default)]
    pub fingerprint: u64,
}
