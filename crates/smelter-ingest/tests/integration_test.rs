//! Integration tests for smelter-ingest.
//!
//! Tests end-to-end ingestion workflows with real file I/O.

use serde_json::Value;
use smelter_ingest::{
    enumerate_dir, enumerate_jsonl, DialogueConverter, JsonlConverter, Pipeline, PipelineConfig,
    PlainTextConverter, RotatingWriter, WriterConfig,
};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tempfile::TempDir;

/// Create a directory of text files; every file shares one paragraph and
/// repeats its own first paragraph at the end.
fn create_text_corpus(dir: &Path, num_files: usize) {
    for i in 0..num_files {
        let path = dir.join(format!("doc{i:02}.txt"));
        let content = format!(
            "Unique opening line for document {i}.\nEvery file carries this shared line.\nUnique opening line for document {i}.\n"
        );
        fs::write(path, content).unwrap();
    }
}

fn read_output_lines(files: &[std::path::PathBuf]) -> Vec<Value> {
    let mut lines = Vec::new();
    for path in files {
        for line in fs::read_to_string(path).unwrap().lines() {
            lines.push(serde_json::from_str(line).unwrap());
        }
    }
    lines
}

#[test]
fn test_text_dir_to_jsonl_stream() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir(&input).unwrap();
    create_text_corpus(&input, 6);

    let items = enumerate_dir(&input, Some("txt")).unwrap();
    assert_eq!(items.len(), 6);

    let writer = RotatingWriter::open(WriterConfig::new(&output)).unwrap();
    let pipeline = Pipeline::new(PipelineConfig::new().with_workers(3));
    let stats = pipeline
        .run(items, &PlainTextConverter::new(), writer)
        .unwrap();

    assert_eq!(stats.items_enumerated, 6);
    assert_eq!(stats.records_converted, 6);
    assert_eq!(stats.items_failed, 0);
    assert_eq!(stats.records_written, 6);
    assert_eq!(stats.files.len(), 1);
    assert!(stats.files[0].ends_with("000.jsonl"));

    let lines = read_output_lines(&stats.files);
    assert_eq!(lines.len(), 6);

    for value in &lines {
        assert!(value["文件名"].as_str().unwrap().ends_with(".txt"));
        assert_eq!(value["段落数"], 3);
        assert_eq!(value["去重段落数"], 2);
        assert_eq!(value["时间"].as_str().unwrap().len(), 8);
        assert!(value["simhash"].as_u64().is_some());

        let paragraphs = value["段落"].as_array().unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0]["是否重复"], false);
        assert_eq!(paragraphs[2]["是否重复"], true);
        assert_eq!(paragraphs[0]["md5"], paragraphs[2]["md5"]);
        assert_ne!(paragraphs[0]["md5"], paragraphs[1]["md5"]);
        assert_eq!(paragraphs[0]["行号"], 1);
        assert_eq!(paragraphs[2]["行号"], 3);
    }
}

#[test]
fn test_jsonl_source_with_metadata() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input.jsonl");
    let output = temp.path().join("output");

    let mut file = fs::File::create(&input).unwrap();
    writeln!(
        file,
        r#"{{"title": "alpha", "date": "2021-06-01", "text": "first paragraph\nsecond paragraph", "meta": {{"lang": "en"}}}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"title": "beta", "date": "2021-06-02", "text": "only paragraph", "meta": {{"lang": "de"}}}}"#
    )
    .unwrap();
    drop(file);

    let items = enumerate_jsonl(&input).unwrap();
    let converter = JsonlConverter::new()
        .with_id_field("title")
        .with_time_field("date");
    let writer = RotatingWriter::open(WriterConfig::new(&output)).unwrap();
    let stats = Pipeline::new(PipelineConfig::new().with_workers(1))
        .run(items, &converter, writer)
        .unwrap();

    assert_eq!(stats.records_written, 2);

    let lines = read_output_lines(&stats.files);
    assert_eq!(lines[0]["文件名"], "alpha");
    assert_eq!(lines[0]["时间"], "20210601");
    assert_eq!(lines[0]["段落数"], 2);
    assert_eq!(lines[0]["扩展字段"], r#"{"lang":"en"}"#);
    assert_eq!(lines[1]["文件名"], "beta");
    assert_eq!(lines[1]["时间"], "20210602");
}

#[test]
fn test_dialogue_source_to_forum_stream() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("dialogues.jsonl");
    let output = temp.path().join("output");

    let mut file = fs::File::create(&input).unwrap();
    writeln!(
        file,
        r#"{{"id": "NPR-1", "title": "First", "program": "news", "date": "2020-02-02", "url": "https://example.org/1", "summary": "s1", "speaker": ["A", "B"], "utt": ["hello", "world"]}}"#
    )
    .unwrap();
    writeln!(
        file,
        r#"{{"id": "NPR-2", "title": "Second", "program": "news", "date": "2020-02-03", "url": "https://example.org/2", "summary": "s2", "speaker": ["C"], "utt": ["solo"]}}"#
    )
    .unwrap();
    drop(file);

    let items = enumerate_jsonl(&input).unwrap();
    let writer = RotatingWriter::open(WriterConfig::new(&output)).unwrap();
    let stats = Pipeline::new(PipelineConfig::new().with_workers(1))
        .run(items, &DialogueConverter::new(), writer)
        .unwrap();

    assert_eq!(stats.records_written, 2);

    let lines = read_output_lines(&stats.files);
    assert_eq!(lines[0]["ID"], 0);
    assert_eq!(lines[0]["主题"], "First");
    assert_eq!(lines[0]["时间"], "20200202");
    assert_eq!(lines[0]["来源"], "https://example.org/1");
    assert_eq!(lines[0]["元数据"]["源ID"], "NPR-1");

    let replies = lines[0]["回复"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["楼ID"], "0");
    assert_eq!(replies[0]["回复"], "hello");
    assert_eq!(replies[1]["楼ID"], "1");

    assert_eq!(lines[1]["ID"], 1);
    assert_eq!(lines[1]["回复"].as_array().unwrap().len(), 1);
}

#[test]
fn test_gzip_stream_roundtrip() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir(&input).unwrap();
    create_text_corpus(&input, 4);

    let items = enumerate_dir(&input, Some("txt")).unwrap();
    let config = WriterConfig::new(&output).with_name_template("{idx}.jsonl.gz");
    let writer = RotatingWriter::open(config).unwrap();
    let stats = Pipeline::new(PipelineConfig::new())
        .run(items, &PlainTextConverter::new(), writer)
        .unwrap();

    assert_eq!(stats.records_written, 4);
    assert!(stats.files[0].ends_with("000.jsonl.gz"));

    let file = fs::File::open(&stats.files[0]).unwrap();
    let reader = BufReader::new(flate2::read::GzDecoder::new(file));
    let mut count = 0;
    for line in reader.lines() {
        let value: Value = serde_json::from_str(&line.unwrap()).unwrap();
        assert!(value["文件名"].as_str().is_some());
        count += 1;
    }
    assert_eq!(count, 4);
}

#[test]
fn test_rotation_keeps_every_record() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input");
    let output = temp.path().join("output");
    fs::create_dir(&input).unwrap();
    create_text_corpus(&input, 12);

    let items = enumerate_dir(&input, Some("txt")).unwrap();
    let config = WriterConfig::new(&output).with_size_limit_bytes(2_000);
    let writer = RotatingWriter::open(config).unwrap();
    let stats = Pipeline::new(PipelineConfig::new().with_workers(2))
        .run(items, &PlainTextConverter::new(), writer)
        .unwrap();

    assert!(stats.files.len() > 1);
    assert_eq!(read_output_lines(&stats.files).len(), 12);

    // File names follow the zero-padded index sequence
    for (i, path) in stats.files.iter().enumerate() {
        assert!(path.ends_with(format!("{i:03}.jsonl")));
    }
}

#[test]
fn test_bad_lines_do_not_stop_the_run() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input.jsonl");
    let output = temp.path().join("output");

    let mut file = fs::File::create(&input).unwrap();
    writeln!(file, r#"{{"text": "good one"}}"#).unwrap();
    writeln!(file, "not even json").unwrap();
    writeln!(file, r#"{{"body": "missing text field"}}"#).unwrap();
    writeln!(file, r#"{{"text": "good two"}}"#).unwrap();
    drop(file);

    let items = enumerate_jsonl(&input).unwrap();
    let writer = RotatingWriter::open(WriterConfig::new(&output)).unwrap();
    let stats = Pipeline::new(PipelineConfig::new())
        .run(items, &JsonlConverter::new(), writer)
        .unwrap();

    assert_eq!(stats.items_enumerated, 4);
    assert_eq!(stats.records_converted, 2);
    assert_eq!(stats.items_failed, 2);
    assert_eq!(stats.records_written, 2);
    assert_eq!(read_output_lines(&stats.files).len(), 2);
}
