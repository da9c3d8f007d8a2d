//! Forum thread records for dialogue-shaped sources.
//!
//! Same wire-key convention as [`crate::document`]. Replies keep their
//! source order; the first reply is the opening post. No deduplication
//! is applied to forum content.

use serde::{Deserialize, Serialize};

/// One reply in a forum thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumReply {
    /// Reply identifier within the thread.
    #[serde(rename = "楼ID")]
    pub reply_id: String,
    /// Reply text.
    #[serde(rename = "回复")]
    pub content: String,
    /// Opaque source-specific metadata, serialized form.
    #[serde(rename = "扩展字段", default)]
    pub extension: String,
}

impl ForumReply {
    /// Create a reply with an empty extension field.
    #[must_use]
    pub fn new(reply_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            reply_id: reply_id.into(),
            content: content.into(),
            extension: String::new(),
        }
    }

    /// Attach an opaque extension payload.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Canonical record for one thread of a dialogue/forum source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumThread {
    /// Thread identifier.
    #[serde(rename = "ID")]
    pub id: i64,
    /// Thread subject.
    #[serde(rename = "主题")]
    pub subject: String,
    /// Origin of the thread, usually a site name or URL.
    #[serde(rename = "来源", default)]
    pub source: String,
    /// Replies in source order.
    #[serde(rename = "回复", default)]
    pub replies: Vec<ForumReply>,
    /// Opaque thread metadata; arbitrary JSON, empty string when absent.
    #[serde(rename = "元数据", default = "default_meta")]
    pub meta: serde_json::Value,
    /// Creation date, YYYYMMDD.
    #[serde(rename = "时间")]
    pub create_time: String,
}

fn default_meta() -> serde_json::Value {
    serde_json::Value::String(String::new())
}

impl ForumThread {
    /// Create an empty thread.
    #[must_use]
    pub fn new(id: i64, subject: impl Into<String>, create_time: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
            source: String::new(),
            replies: Vec::new(),
            meta: default_meta(),
            create_time: create_time.into(),
        }
    }

    /// Set the thread source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the thread metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// Append a reply.
    pub fn push_reply(&mut self, reply: ForumReply) {
        self.replies.push(reply);
    }
}
