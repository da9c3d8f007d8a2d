//! Source-format converters and enumeration helpers.
//!
//! Converters turn enumerated [`SourceItem`]s into records:
//!
//! - [`PlainTextConverter`]: one text file per document
//! - [`JsonlConverter`]: one JSON object per document, configurable fields
//! - [`DialogueConverter`]: interview dialogues as forum threads

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;
use smelter_core::{Result, SmelterError};

use crate::builder::DocumentBuilder;
use crate::forum::{ForumReply, ForumThread};
use crate::pipeline::{Converter, Payload, SourceItem};
use crate::record::Record;

/// Converts whole text files into documents.
///
/// The document id is the file name and the file content is split into
/// paragraphs on newlines.
pub struct PlainTextConverter {
    builder: DocumentBuilder,
}

impl PlainTextConverter {
    /// Converter with default document building.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: DocumentBuilder::new(),
        }
    }

    /// Replace the document builder.
    #[must_use]
    pub fn with_builder(mut self, builder: DocumentBuilder) -> Self {
        self.builder = builder;
        self
    }
}

impl Default for PlainTextConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for PlainTextConverter {
    fn convert(&self, item: &SourceItem) -> Result<Option<Record>> {
        let (text_id, text) = match &item.payload {
            Payload::File(path) => {
                let text = fs::read_to_string(path)?;
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| item.id.clone());
                (name, text)
            }
            Payload::Text(text) => (item.id.clone(), text.clone()),
            Payload::Json(_) => return Ok(None),
        };
        let doc = self.builder.build_text(&text_id, &text, None)?;
        Ok(Some(Record::Document(doc)))
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}

/// Converts JSON objects (one per JSONL line) into documents.
///
/// The text field is required; id, create-time, and metadata fields are
/// optional lookups. The metadata value is serialized compactly into the
/// document's extension field.
pub struct JsonlConverter {
    builder: DocumentBuilder,
    text_field: String,
    id_field: Option<String>,
    time_field: Option<String>,
    meta_field: Option<String>,
}

impl JsonlConverter {
    /// Converter reading text from `"text"` and metadata from `"meta"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: DocumentBuilder::new(),
            text_field: "text".to_string(),
            id_field: None,
            time_field: None,
            meta_field: Some("meta".to_string()),
        }
    }

    /// Replace the document builder.
    #[must_use]
    pub fn with_builder(mut self, builder: DocumentBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Field holding the document text.
    #[must_use]
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    /// Field holding the document id. Falls back to the item id.
    #[must_use]
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    /// Field holding the creation date. Dashes are stripped.
    #[must_use]
    pub fn with_time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = Some(field.into());
        self
    }

    /// Field whose value is serialized into the document extension field.
    #[must_use]
    pub fn with_meta_field(mut self, field: impl Into<String>) -> Self {
        self.meta_field = Some(field.into());
        self
    }
}

impl Default for JsonlConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for JsonlConverter {
    fn convert(&self, item: &SourceItem) -> Result<Option<Record>> {
        let value = parse_payload(item)?;
        let Some(value) = value else {
            return Ok(None);
        };

        let text = value
            .get(&self.text_field)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SmelterError::InvalidInput(format!("missing text field `{}`", self.text_field))
            })?;

        let text_id = self
            .id_field
            .as_deref()
            .and_then(|field| field_as_string(&value, field))
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| item.id.clone());

        let create_time = self
            .time_field
            .as_deref()
            .and_then(|field| field_as_string(&value, field))
            .map(|raw| normalize_date(&raw));

        let mut doc = self.builder.build_text(&text_id, text, create_time.as_deref())?;

        if let Some(meta_field) = self.meta_field.as_deref() {
            if let Some(meta) = value.get(meta_field) {
                doc.extension = serde_json::to_string(meta)?;
            }
        }

        Ok(Some(Record::Document(doc)))
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Converts interview dialogues into forum threads.
///
/// Expects parallel `speaker` and `utt` arrays plus a `date`; `title`,
/// `url`, `id`, `summary`, and `program` are optional. The thread id is the
/// item sequence number and each utterance becomes one reply carrying its
/// speaker in the extension field.
#[derive(Clone, Copy, Debug, Default)]
pub struct DialogueConverter;

impl DialogueConverter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Converter for DialogueConverter {
    fn convert(&self, item: &SourceItem) -> Result<Option<Record>> {
        let value = parse_payload(item)?;
        let Some(value) = value else {
            return Ok(None);
        };

        let speakers = string_array(&value, "speaker")?;
        let utterances = string_array(&value, "utt")?;
        if speakers.len() != utterances.len() {
            return Err(SmelterError::InvalidInput(format!(
                "speaker/utt length mismatch: {} vs {}",
                speakers.len(),
                utterances.len()
            )));
        }

        let date = value
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| SmelterError::InvalidInput("missing date field".to_string()))?;
        let subject = value.get("title").and_then(Value::as_str).unwrap_or_default();

        let mut thread = ForumThread::new(item.seq as i64, subject, normalize_date(date));
        if let Some(url) = value.get("url").and_then(Value::as_str) {
            thread = thread.with_source(url);
        }

        let mut meta = serde_json::Map::new();
        if let Some(source_id) = value.get("id").and_then(Value::as_str) {
            meta.insert("源ID".to_string(), Value::String(source_id.to_string()));
        }
        if let Some(summary) = value.get("summary").and_then(Value::as_str) {
            meta.insert("摘要".to_string(), Value::String(summary.to_string()));
        }
        if let Some(program) = value.get("program").and_then(Value::as_str) {
            meta.insert("分类".to_string(), Value::String(program.to_string()));
        }
        if !meta.is_empty() {
            thread = thread.with_meta(Value::Object(meta));
        }

        for (idx, (speaker, utterance)) in speakers.iter().zip(utterances.iter()).enumerate() {
            let extension = serde_json::to_string(&serde_json::json!({ "说话者": speaker }))?;
            thread.push_reply(ForumReply::new(idx.to_string(), utterance.clone()).with_extension(extension));
        }

        Ok(Some(Record::Forum(thread)))
    }

    fn name(&self) -> &str {
        "dialogue"
    }
}

fn parse_payload(item: &SourceItem) -> Result<Option<Value>> {
    match &item.payload {
        Payload::Json(value) => Ok(Some(value.clone())),
        Payload::Text(text) => Ok(Some(serde_json::from_str(text)?)),
        Payload::File(_) => Ok(None),
    }
}

fn field_as_string(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_array(value: &Value, field: &str) -> Result<Vec<String>> {
    let entries = value.get(field).and_then(Value::as_array).ok_or_else(|| {
        SmelterError::InvalidInput(format!("missing array field `{field}`"))
    })?;
    entries
        .iter()
        .map(|entry| {
            entry.as_str().map(str::to_string).ok_or_else(|| {
                SmelterError::InvalidInput(format!("non-string entry in `{field}`"))
            })
        })
        .collect()
}

fn normalize_date(raw: &str) -> String {
    raw.replace('-', "").trim().to_string()
}

/// Enumerate files in `dir`, optionally filtered by extension, sorted by
/// path for deterministic sequence numbers.
pub fn enumerate_dir(dir: &Path, extension: Option<&str>) -> Result<Vec<SourceItem>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(wanted) = extension {
            if path.extension().and_then(|e| e.to_str()) != Some(wanted) {
                continue;
            }
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(seq, path)| SourceItem::from_path(path, seq as u64))
        .collect())
}

/// Enumerate a JSONL file as one item per non-blank line.
///
/// Item ids are `<path>:<line>` with 1-based line numbers; sequence numbers
/// are the 0-based line indexes.
pub fn enumerate_jsonl(path: &Path) -> Result<Vec<SourceItem>> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let id = format!("{}:{}", path.display(), line_no + 1);
        items.push(SourceItem::from_text(id, line, line_no as u64));
    }
    Ok(items)
}
