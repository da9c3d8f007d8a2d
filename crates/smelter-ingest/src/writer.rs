//! Size-limited rotating JSONL writer.
//!
//! Records are serialized one per line into sequentially numbered files.
//! Rotation is checked before each record, never in the middle of one:
//! a record is written whole even when it alone exceeds the size limit.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use smelter_core::{Result, SmelterError};
use tracing::{debug, warn};

/// Default zero-padding width for file indices.
pub const DEFAULT_INDEX_WIDTH: usize = 3;

/// Default per-file size limit in MiB.
pub const DEFAULT_SIZE_LIMIT_MB: u64 = 500;

/// Default filename template.
pub const DEFAULT_NAME_TEMPLATE: &str = "{idx}.jsonl";

const INDEX_PLACEHOLDER: &str = "{idx}";

/// Configuration for [`RotatingWriter`].
#[derive(Clone, Debug)]
pub struct WriterConfig {
    /// Output directory, created if absent.
    pub directory: PathBuf,
    /// Index of the first file.
    pub index_start: u64,
    /// Zero-padding width for the index.
    pub index_width: usize,
    /// Index increment between files; values ≤ 0 are coerced to 1.
    pub index_stride: i64,
    /// Filename template with an `{idx}` placeholder.
    pub name_template: String,
    /// Rotation threshold in bytes of encoded output.
    pub size_limit_bytes: u64,
    /// Gzip the stream; follows the template suffix unless overridden.
    pub compressed: bool,
}

impl WriterConfig {
    /// Create a config with default naming and a 500 MiB limit.
    #[must_use]
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            index_start: 0,
            index_width: DEFAULT_INDEX_WIDTH,
            index_stride: 1,
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            size_limit_bytes: DEFAULT_SIZE_LIMIT_MB * (1 << 20),
            compressed: false,
        }
    }

    /// Set the first file index.
    #[must_use]
    pub fn with_index_start(mut self, index_start: u64) -> Self {
        self.index_start = index_start;
        self
    }

    /// Set the index zero-padding width.
    #[must_use]
    pub fn with_index_width(mut self, index_width: usize) -> Self {
        self.index_width = index_width;
        self
    }

    /// Set the index stride.
    #[must_use]
    pub fn with_index_stride(mut self, index_stride: i64) -> Self {
        self.index_stride = index_stride;
        self
    }

    /// Set the filename template; a `.gz` suffix switches on compression.
    #[must_use]
    pub fn with_name_template(mut self, name_template: impl Into<String>) -> Self {
        self.name_template = name_template.into();
        self.compressed = self.name_template.ends_with(".gz");
        self
    }

    /// Set the rotation threshold in bytes.
    #[must_use]
    pub fn with_size_limit_bytes(mut self, size_limit_bytes: u64) -> Self {
        self.size_limit_bytes = size_limit_bytes;
        self
    }

    /// Set the rotation threshold in MiB (MB × 2^20 bytes).
    #[must_use]
    pub fn with_size_limit_mb(mut self, size_limit_mb: u64) -> Self {
        self.size_limit_bytes = size_limit_mb * (1 << 20);
        self
    }

    /// Override stream compression independently of the template suffix.
    #[must_use]
    pub fn with_compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }
}

/// Counters accumulated over the writer's lifetime.
#[derive(Clone, Debug, Default)]
pub struct WriterStats {
    /// Files opened, including the eager first file.
    pub files_opened: usize,
    /// Records (lines) written.
    pub records_written: u64,
    /// Encoded bytes written, pre-compression, newlines included.
    pub bytes_written: u64,
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.write_all(buf),
            Sink::Gzip(w) => w.write_all(buf),
        }
    }

    fn finish(self) -> std::io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(w) => w.finish().and_then(|mut inner| inner.flush()),
        }
    }
}

/// Writes newline-delimited records into size-capped, numbered files.
pub struct RotatingWriter {
    config: WriterConfig,
    sink: Option<Sink>,
    next_index: u64,
    current_bytes: u64,
    files: Vec<PathBuf>,
    stats: WriterStats,
}

impl RotatingWriter {
    /// Validate the config, create the directory, and open the first file.
    pub fn open(config: WriterConfig) -> Result<Self> {
        if config.size_limit_bytes == 0 {
            return Err(SmelterError::Config(
                "size limit must be positive".to_string(),
            ));
        }
        if !config.name_template.contains(INDEX_PLACEHOLDER) {
            return Err(SmelterError::Config(format!(
                "name template {:?} has no {INDEX_PLACEHOLDER} placeholder",
                config.name_template
            )));
        }

        let mut config = config;
        if config.index_stride <= 0 {
            config.index_stride = 1;
        }

        fs::create_dir_all(&config.directory)?;

        let mut writer = Self {
            next_index: config.index_start,
            config,
            sink: None,
            current_bytes: 0,
            files: Vec::new(),
            stats: WriterStats::default(),
        };
        writer.open_next_file()?;
        Ok(writer)
    }

    /// Serialize a record as one JSON line and write it.
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        let encoded = match serde_json::to_vec(record) {
            Ok(mut line) => {
                line.push(b'\n');
                line
            }
            Err(e) => {
                self.sink = None;
                return Err(SmelterError::Json(e));
            }
        };
        self.write_encoded(&encoded)
    }

    /// Write a pre-encoded payload as one line.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let mut encoded = Vec::with_capacity(line.len() + 1);
        encoded.extend_from_slice(line);
        encoded.push(b'\n');
        self.write_encoded(&encoded)
    }

    /// Flush and close the current file. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.finish()?;
        }
        Ok(())
    }

    /// Paths of all files opened so far, in order.
    #[must_use]
    pub fn files_created(&self) -> &[PathBuf] {
        &self.files
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    fn write_encoded(&mut self, encoded: &[u8]) -> Result<()> {
        match self.try_write(encoded) {
            Ok(()) => Ok(()),
            Err(e) => {
                // A failed writer stays closed; callers must not retry
                self.sink = None;
                Err(e)
            }
        }
    }

    fn try_write(&mut self, encoded: &[u8]) -> Result<()> {
        if self.sink.is_none() {
            return Err(SmelterError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "writer is closed",
            )));
        }

        // Rotate before this record once earlier ones filled the file; the
        // record that crossed the limit stayed whole in the previous file
        if self.current_bytes >= self.config.size_limit_bytes {
            self.rotate()?;
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.write_all(encoded)?;
        }
        self.current_bytes += encoded.len() as u64;
        self.stats.records_written += 1;
        self.stats.bytes_written += encoded.len() as u64;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.finish()?;
        }
        self.open_next_file()
    }

    fn open_next_file(&mut self) -> Result<()> {
        let path = self.path_for_index(self.next_index);
        debug!(path = %path.display(), "opening output file");

        let file = File::create(&path)?;
        let buffered = BufWriter::new(file);
        self.sink = Some(if self.config.compressed {
            Sink::Gzip(GzEncoder::new(buffered, Compression::default()))
        } else {
            Sink::Plain(buffered)
        });

        self.next_index += self.config.index_stride as u64;
        self.current_bytes = 0;
        self.files.push(path);
        self.stats.files_opened += 1;
        Ok(())
    }

    fn path_for_index(&self, index: u64) -> PathBuf {
        let padded = format!("{index:0width$}", width = self.config.index_width);
        let name = self.config.name_template.replace(INDEX_PLACEHOLDER, &padded);
        self.config.directory.join(name)
    }
}

impl Drop for RotatingWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to flush rotating writer on drop: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read};
    use tempfile::TempDir;

    fn file_names(writer: &RotatingWriter) -> Vec<String> {
        writer
            .files_created()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        let reader = BufReader::new(File::open(path).unwrap());
        reader.lines().map(|l| l.unwrap()).collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = WriterConfig::new("out");

        assert_eq!(config.index_start, 0);
        assert_eq!(config.index_width, 3);
        assert_eq!(config.index_stride, 1);
        assert_eq!(config.name_template, "{idx}.jsonl");
        assert_eq!(config.size_limit_bytes, 500 * (1 << 20));
        assert!(!config.compressed);
    }

    #[test]
    fn test_zero_size_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_size_limit_mb(0);

        match RotatingWriter::open(config).map(|_| ()).unwrap_err() {
            SmelterError::Config(_) => {}
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_template_requires_placeholder() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_name_template("output.jsonl");

        assert!(matches!(
            RotatingWriter::open(config).map(|_| ()),
            Err(SmelterError::Config(_))
        ));
    }

    #[test]
    fn test_eager_first_file() {
        let dir = TempDir::new().unwrap();
        let mut writer = RotatingWriter::open(WriterConfig::new(dir.path())).unwrap();

        let first = dir.path().join("000.jsonl");
        assert!(first.exists());
        assert_eq!(writer.files_created(), &[first]);
        writer.close().unwrap();
    }

    #[test]
    fn test_rotation_never_splits_records() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_size_limit_bytes(50);
        let mut writer = RotatingWriter::open(config).unwrap();

        // Each line is 29 bytes, so two lines cross the 50-byte limit
        for i in 0..5 {
            let record = serde_json::json!({"id": i, "text": "aaaaaaaaaa"});
            writer.write_record(&record).unwrap();
        }
        writer.close().unwrap();

        assert_eq!(file_names(&writer), ["000.jsonl", "001.jsonl", "002.jsonl"]);

        let mut total = 0;
        for (path, expected) in writer.files_created().iter().zip([2, 2, 1]) {
            let lines = read_lines(path);
            assert_eq!(lines.len(), expected);
            for line in &lines {
                // Every line must be a complete record
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                assert_eq!(value["text"], "aaaaaaaaaa");
            }
            total += lines.len();
        }
        assert_eq!(total, 5);
    }

    #[test]
    fn test_oversized_record_stays_whole() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_size_limit_bytes(10);
        let mut writer = RotatingWriter::open(config).unwrap();

        let big = "x".repeat(100);
        writer.write_line(big.as_bytes()).unwrap();
        writer.write_line(b"next").unwrap();
        writer.close().unwrap();

        let lines0 = read_lines(&writer.files_created()[0]);
        assert_eq!(lines0, vec![big]);
        let lines1 = read_lines(&writer.files_created()[1]);
        assert_eq!(lines1, vec!["next"]);
    }

    #[test]
    fn test_index_start_stride_width() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path())
            .with_index_start(10)
            .with_index_stride(5)
            .with_index_width(4)
            .with_size_limit_bytes(5);
        let mut writer = RotatingWriter::open(config).unwrap();

        for _ in 0..3 {
            writer.write_line(b"123456").unwrap();
        }
        writer.close().unwrap();

        assert_eq!(file_names(&writer), ["0010.jsonl", "0015.jsonl", "0020.jsonl"]);
    }

    #[test]
    fn test_nonpositive_stride_coerced() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path())
            .with_index_stride(-3)
            .with_size_limit_bytes(5);
        let mut writer = RotatingWriter::open(config).unwrap();

        writer.write_line(b"123456").unwrap();
        writer.write_line(b"123456").unwrap();
        writer.close().unwrap();

        assert_eq!(file_names(&writer), ["000.jsonl", "001.jsonl"]);
    }

    #[test]
    fn test_gzip_roundtrip() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_name_template("{idx}.jsonl.gz");
        assert!(config.compressed);
        let mut writer = RotatingWriter::open(config).unwrap();

        for i in 0..3 {
            writer.write_record(&serde_json::json!({"id": i})).unwrap();
        }
        writer.close().unwrap();

        let path = dir.path().join("000.jsonl.gz");
        let mut decoder = flate2::read::GzDecoder::new(File::open(path).unwrap());
        let mut text = String::new();
        decoder.read_to_string(&mut text).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["id"], i);
        }
    }

    #[test]
    fn test_close_idempotent_and_write_after_close() {
        let dir = TempDir::new().unwrap();
        let mut writer = RotatingWriter::open(WriterConfig::new(dir.path())).unwrap();

        writer.write_line(b"one").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        match writer.write_line(b"two").unwrap_err() {
            SmelterError::Io(_) => {}
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_drop_flushes() {
        let dir = TempDir::new().unwrap();
        let path;
        {
            let mut writer = RotatingWriter::open(WriterConfig::new(dir.path())).unwrap();
            writer.write_record(&serde_json::json!({"id": 7})).unwrap();
            path = writer.files_created()[0].clone();
            // No explicit close
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("7"));
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let config = WriterConfig::new(dir.path()).with_size_limit_bytes(5);
        let mut writer = RotatingWriter::open(config).unwrap();

        writer.write_line(b"123456").unwrap();
        writer.write_line(b"123456").unwrap();
        writer.close().unwrap();

        let stats = writer.stats();
        assert_eq!(stats.files_opened, 2);
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.bytes_written, 14);
    }
}
