//! smelter-ingest CLI - Corpus ingestion into canonical JSONL.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use smelter_ingest::{
    enumerate_dir, enumerate_jsonl, Converter, DialogueConverter, DocumentBuilder, JsonlConverter,
    Pipeline, PipelineConfig, PlainTextConverter, RotatingWriter, SourceItem, WriterConfig,
};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// JSON output for ingestion results.
#[derive(Serialize)]
struct JsonOutput {
    input: String,
    output: String,
    format: String,
    items_enumerated: u64,
    records_converted: u64,
    items_skipped: u64,
    items_failed: u64,
    records_written: u64,
    files: Vec<String>,
    elapsed_secs: f64,
    throughput_items_s: f64,
}

/// Source format of the input.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum SourceFormat {
    /// Directory of plain text files, one document per file
    Text,
    /// JSONL file, one document object per line
    Jsonl,
    /// JSONL file of interview dialogues, one forum thread per line
    Dialogue,
}

impl SourceFormat {
    fn as_str(self) -> &'static str {
        match self {
            SourceFormat::Text => "text",
            SourceFormat::Jsonl => "jsonl",
            SourceFormat::Dialogue => "dialogue",
        }
    }
}

/// Corpus ingestion into canonical JSONL.
///
/// Converts heterogeneous raw sources (text file trees, JSONL exports,
/// dialogue dumps) into size-limited streams of canonical records carrying
/// paragraph-level dedup marks and simhash fingerprints.
#[derive(Parser, Debug)]
#[command(name = "smelter-ingest")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input path: a directory (text) or a JSONL file (jsonl/dialogue).
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory for the rotated JSONL stream.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Source format of the input.
    #[arg(long, value_enum, default_value = "text")]
    format: SourceFormat,

    /// Field containing the document text (jsonl format).
    #[arg(long, default_value = "text")]
    text_field: String,

    /// Field containing the document id (jsonl format).
    #[arg(long)]
    id_field: Option<String>,

    /// Field containing the creation date (jsonl format).
    #[arg(long)]
    time_field: Option<String>,

    /// Field serialized into the document extension field (jsonl format).
    #[arg(long, default_value = "meta")]
    meta_field: String,

    /// File extension filter for text directories.
    #[arg(long, default_value = "txt")]
    extension: String,

    /// Number of converter workers.
    #[arg(short, long, default_value = "4")]
    workers: usize,

    /// Capacity of the bounded work and output queues.
    #[arg(long, default_value = "64")]
    queue_capacity: usize,

    /// Rotate output files once they reach this many megabytes.
    #[arg(long, default_value = "500")]
    size_limit_mb: u64,

    /// Gzip-compress output files.
    #[arg(long)]
    gzip: bool,

    /// First output file index.
    #[arg(long, default_value = "0")]
    index_start: u64,

    /// Zero-padded width of output file indexes.
    #[arg(long, default_value = "3")]
    index_width: usize,

    /// Increment between consecutive output file indexes.
    #[arg(long, default_value = "1")]
    index_stride: i64,

    /// Keep surrounding whitespace in stored paragraphs.
    #[arg(long)]
    no_trim: bool,

    /// Output results as JSON.
    #[arg(long)]
    json: bool,

    /// Suppress the progress spinner and informational logs.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Create a spinner for indeterminate progress.
fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Handle completions subcommand
    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "smelter-ingest", &mut io::stdout());
        return Ok(());
    }

    let default_filter = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let input = args.input.clone().ok_or("Input path is required")?;
    let output = args
        .output
        .clone()
        .ok_or("Output directory is required (use -o/--output)")?;

    // Validate arguments
    if args.size_limit_mb == 0 {
        eprintln!("Error: size limit must be > 0");
        std::process::exit(1);
    }

    if args.workers == 0 {
        eprintln!("Error: workers must be > 0");
        std::process::exit(1);
    }

    match args.format {
        SourceFormat::Text if !input.is_dir() => {
            eprintln!("Error: text format expects a directory: {}", input.display());
            std::process::exit(1);
        }
        SourceFormat::Jsonl | SourceFormat::Dialogue if !input.is_file() => {
            eprintln!(
                "Error: {} format expects a JSONL file: {}",
                args.format.as_str(),
                input.display()
            );
            std::process::exit(1);
        }
        _ => {}
    }

    let start = Instant::now();

    let pb = if !args.quiet && !args.json {
        Some(create_spinner("Enumerating input..."))
    } else {
        None
    };

    let items: Vec<SourceItem> = match args.format {
        SourceFormat::Text => enumerate_dir(&input, Some(args.extension.as_str()))?,
        SourceFormat::Jsonl | SourceFormat::Dialogue => enumerate_jsonl(&input)?,
    };

    if let Some(ref pb) = pb {
        pb.set_message(format!("Converting {} items...", items.len()));
    }

    let builder = DocumentBuilder::new().with_trim(!args.no_trim);
    let converter: Box<dyn Converter> = match args.format {
        SourceFormat::Text => Box::new(PlainTextConverter::new().with_builder(builder)),
        SourceFormat::Jsonl => {
            let mut converter = JsonlConverter::new()
                .with_builder(builder)
                .with_text_field(&args.text_field)
                .with_meta_field(&args.meta_field);
            if let Some(ref field) = args.id_field {
                converter = converter.with_id_field(field);
            }
            if let Some(ref field) = args.time_field {
                converter = converter.with_time_field(field);
            }
            Box::new(converter)
        }
        SourceFormat::Dialogue => Box::new(DialogueConverter::new()),
    };

    let mut writer_config = WriterConfig::new(&output)
        .with_index_start(args.index_start)
        .with_index_width(args.index_width)
        .with_index_stride(args.index_stride)
        .with_size_limit_mb(args.size_limit_mb);
    if args.gzip {
        writer_config = writer_config.with_name_template("{idx}.jsonl.gz");
    }
    let writer = RotatingWriter::open(writer_config)?;

    let pipeline = Pipeline::new(
        PipelineConfig::new()
            .with_workers(args.workers)
            .with_queue_capacity(args.queue_capacity),
    );
    let stats = pipeline.run(items, converter.as_ref(), writer)?;

    let elapsed = start.elapsed();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if args.json {
        let summary = JsonOutput {
            input: input.display().to_string(),
            output: output.display().to_string(),
            format: args.format.as_str().to_string(),
            items_enumerated: stats.items_enumerated,
            records_converted: stats.records_converted,
            items_skipped: stats.items_skipped,
            items_failed: stats.items_failed,
            records_written: stats.records_written,
            files: stats.files.iter().map(|p| p.display().to_string()).collect(),
            elapsed_secs: elapsed.as_secs_f64(),
            throughput_items_s: stats.items_enumerated as f64 / elapsed.as_secs_f64(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        eprintln!();
        eprintln!("Ingestion Results:");
        eprintln!("  Items enumerated:  {}", stats.items_enumerated);
        eprintln!("  Records converted: {}", stats.records_converted);
        eprintln!("  Items skipped:     {}", stats.items_skipped);
        eprintln!("  Items failed:      {}", stats.items_failed);
        eprintln!("  Records written:   {}", stats.records_written);
        eprintln!("  Output files:      {}", stats.files.len());
        eprintln!();
        eprintln!("Performance:");
        eprintln!("  Processing time:   {:.3}s", elapsed.as_secs_f64());
        eprintln!(
            "  Throughput:        {:.0} items/sec",
            stats.items_enumerated as f64 / elapsed.as_secs_f64()
        );
    }

    Ok(())
}
