//! Bounded enumerate → convert → write pipeline.
//!
//! One enumerator thread feeds a bounded work queue, N converter workers
//! feed a bounded output queue, and a single writer thread owns the
//! RotatingWriter. Stages shut down through explicit sentinels in a fixed
//! order: enumerator first, workers next, writer last.

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde_json::Value;
use smelter_core::Result;
use tracing::{debug, info, warn};

use crate::record::Record;
use crate::writer::{RotatingWriter, WriterStats};

/// Default number of converter workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default bounded queue capacity, in items.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Raw payload of one enumerated work item.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A file to be read by the converter.
    File(PathBuf),
    /// Raw text, e.g. one line of a JSONL source.
    Text(String),
    /// Pre-parsed JSON.
    Json(Value),
}

/// A unit of work produced by enumeration.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Identifier used for logging and as a fallback record id.
    pub id: String,
    /// Position in enumeration order, 0-based.
    pub seq: u64,
    /// Raw payload handed to the converter.
    pub payload: Payload,
}

impl SourceItem {
    /// Item backed by a file on disk.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>, seq: u64) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            seq,
            payload: Payload::File(path),
        }
    }

    /// Item carrying raw text.
    #[must_use]
    pub fn from_text(id: impl Into<String>, text: impl Into<String>, seq: u64) -> Self {
        Self {
            id: id.into(),
            seq,
            payload: Payload::Text(text.into()),
        }
    }

    /// Item carrying pre-parsed JSON.
    #[must_use]
    pub fn from_json(id: impl Into<String>, value: Value, seq: u64) -> Self {
        Self {
            id: id.into(),
            seq,
            payload: Payload::Json(value),
        }
    }
}

/// Per-source conversion plugin.
///
/// Implementations are selected by configuration and shared by reference
/// across the worker pool. `Ok(None)` declines an item; `Err` marks it
/// failed. Neither stops the pipeline.
pub trait Converter: Send + Sync {
    /// Convert one enumerated item into a record.
    fn convert(&self, item: &SourceItem) -> Result<Option<Record>>;

    /// Converter name for logs.
    fn name(&self) -> &str {
        "converter"
    }
}

/// Configuration for a pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of converter workers.
    pub workers: usize,
    /// Capacity of the work and output queues.
    pub queue_capacity: usize,
}

impl PipelineConfig {
    /// Create a config with default worker count and queue capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Set the worker count (minimum 1).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the queue capacity (minimum 1).
    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters for one pipeline run.
#[derive(Clone, Debug, Default)]
pub struct PipelineStats {
    /// Items pushed onto the work queue.
    pub items_enumerated: u64,
    /// Items converted into records.
    pub records_converted: u64,
    /// Items the converter declined.
    pub items_skipped: u64,
    /// Items that failed conversion and were logged.
    pub items_failed: u64,
    /// Records the writer committed.
    pub records_written: u64,
    /// Output files, in creation order.
    pub files: Vec<PathBuf>,
}

/// Orchestrator phase, logged at each transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Enumerating,
    Converting,
    Draining,
    Done,
}

enum WorkMessage {
    Item(SourceItem),
    Done,
}

enum OutputMessage {
    Record(Record),
    Done,
}

#[derive(Default)]
struct WorkerCounts {
    converted: u64,
    skipped: u64,
    failed: u64,
}

/// Runs the enumerate → convert → write pipeline.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Drain `items` through `converter` into `writer`.
    ///
    /// The writer is taken by value and owned by the writer thread for the
    /// whole run; output files are never shared across workers. Item-level
    /// conversion failures are logged and counted, writer failures abort
    /// the run and surface as the returned error.
    pub fn run<I>(
        &self,
        items: I,
        converter: &dyn Converter,
        writer: RotatingWriter,
    ) -> Result<PipelineStats>
    where
        I: IntoIterator<Item = SourceItem>,
        I::IntoIter: Send,
    {
        let workers = self.config.workers.max(1);
        let capacity = self.config.queue_capacity.max(1);

        let (work_tx, work_rx) = bounded::<WorkMessage>(capacity);
        let (out_tx, out_rx) = bounded::<OutputMessage>(capacity);

        let mut phase = Phase::Idle;
        debug!(?phase, workers, capacity, converter = converter.name(), "pipeline starting");

        let items = items.into_iter();
        thread::scope(|scope| {
            phase = Phase::Enumerating;
            debug!(?phase, "pipeline phase");

            let enumerator_tx = work_tx.clone();
            let enumerator = scope.spawn(move || {
                let mut count: u64 = 0;
                for item in items {
                    if enumerator_tx.send(WorkMessage::Item(item)).is_err() {
                        // All workers are gone; the run is being aborted
                        warn!("work queue closed during enumeration");
                        break;
                    }
                    count += 1;
                }
                count
            });

            let mut worker_handles = Vec::with_capacity(workers);
            for worker_id in 0..workers {
                let rx = work_rx.clone();
                let tx = out_tx.clone();
                worker_handles
                    .push(scope.spawn(move || worker_loop(worker_id, &rx, &tx, converter)));
            }
            drop(work_rx);

            let writer_handle = scope.spawn(move || writer_loop(&out_rx, writer));

            let mut stats = PipelineStats {
                items_enumerated: join_thread(enumerator),
                ..PipelineStats::default()
            };

            phase = Phase::Converting;
            debug!(?phase, items = stats.items_enumerated, "pipeline phase");

            // One sentinel per worker, only after enumeration has finished
            for _ in 0..workers {
                let _ = work_tx.send(WorkMessage::Done);
            }
            drop(work_tx);

            for handle in worker_handles {
                let counts = join_thread(handle);
                stats.records_converted += counts.converted;
                stats.items_skipped += counts.skipped;
                stats.items_failed += counts.failed;
            }

            phase = Phase::Draining;
            debug!(?phase, "pipeline phase");

            // The single writer sentinel goes out only after every worker
            // has stopped producing
            let _ = out_tx.send(OutputMessage::Done);
            drop(out_tx);

            let (writer_stats, files) = join_thread(writer_handle)?;
            stats.records_written = writer_stats.records_written;
            stats.files = files;

            phase = Phase::Done;
            info!(
                ?phase,
                enumerated = stats.items_enumerated,
                converted = stats.records_converted,
                skipped = stats.items_skipped,
                failed = stats.items_failed,
                written = stats.records_written,
                "pipeline finished"
            );
            Ok(stats)
        })
    }
}

fn worker_loop(
    worker_id: usize,
    work_rx: &Receiver<WorkMessage>,
    out_tx: &Sender<OutputMessage>,
    converter: &dyn Converter,
) -> WorkerCounts {
    let mut counts = WorkerCounts::default();

    while let Ok(message) = work_rx.recv() {
        let item = match message {
            WorkMessage::Done => break,
            WorkMessage::Item(item) => item,
        };

        match converter.convert(&item) {
            Ok(Some(record)) => {
                if out_tx.send(OutputMessage::Record(record)).is_err() {
                    warn!(worker_id, "output queue closed, stopping worker");
                    break;
                }
                counts.converted += 1;
            }
            Ok(None) => {
                debug!(worker_id, item = %item.id, "converter declined item");
                counts.skipped += 1;
            }
            Err(e) => {
                warn!(worker_id, item = %item.id, seq = item.seq, "conversion failed: {e}");
                counts.failed += 1;
            }
        }
    }

    counts
}

fn writer_loop(
    out_rx: &Receiver<OutputMessage>,
    mut writer: RotatingWriter,
) -> Result<(WriterStats, Vec<PathBuf>)> {
    while let Ok(message) = out_rx.recv() {
        match message {
            OutputMessage::Done => break,
            OutputMessage::Record(record) => {
                if let Err(e) = writer.write_record(&record) {
                    warn!(record = %record.id(), "write failed, aborting run");
                    return Err(e);
                }
            }
        }
    }

    writer.close()?;
    Ok((writer.stats().clone(), writer.files_created().to_vec()))
}

fn join_thread<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
