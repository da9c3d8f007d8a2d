//! # smelter-ingest
//!
//! Corpus ingestion: heterogeneous raw sources in, canonical deduplicated
//! JSONL record streams out.
//!
//! Provides:
//! - Canonical record shapes (general documents, forum threads)
//! - Paragraph-level dedup marking and simhash fingerprints
//! - Source-format converters behind a worker-pool pipeline
//! - Rotating size-limited JSONL output, plain or gzip

pub mod builder;
pub mod convert;
pub mod document;
pub mod forum;
pub mod pipeline;
pub mod record;
pub mod simhash;
pub mod writer;

pub use builder::DocumentBuilder;
pub use convert::{
    enumerate_dir, enumerate_jsonl, DialogueConverter, JsonlConverter, PlainTextConverter,
};
pub use document::{Document, Paragraph};
pub use forum::{ForumReply, ForumThread};
pub use pipeline::{Converter, Payload, Pipeline, PipelineConfig, PipelineStats, SourceItem};
pub use record::Record;
pub use simhash::{hamming_distance, SimHasher};
pub use writer::{RotatingWriter, WriterConfig, WriterStats};
