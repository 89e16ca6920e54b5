use super::*;
use crate::buffer::Compression;
use crate::codec::{CodecRegistry, CsvOptions, FormatOptions};
use crate::grouper::{FieldGrouper, NoGrouper};
use crate::record::{Format, GroupKey, Record};
use flate2::read::GzDecoder;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Sink that decodes and keeps every delivered artifact
#[derive(Default)]
struct RecordingSink {
    deliveries: Vec<(GroupKey, String)>,
    fail_next: bool,
    reported_items: Option<u64>,
}

impl RecordingSink {
    fn delivered_lines(&self) -> u64 {
        self.deliveries
            .iter()
            .map(|(_, content)| content.lines().count() as u64)
            .sum()
    }
}

impl Sink for RecordingSink {
    fn deliver(&mut self, artifact: &Path, membership: &GroupKey) -> Result<(), SinkError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SinkError::Other("storage unavailable".to_string()));
        }
        let mut content = String::new();
        GzDecoder::new(File::open(artifact)?).read_to_string(&mut content)?;
        self.deliveries.push((membership.clone(), content));
        Ok(())
    }

    fn check_consistency(&self, state: &WriterState) -> Result<(), Inconsistency> {
        let stored = self.reported_items.unwrap_or_else(|| self.delivered_lines());
        if stored != state.items_delivered {
            return Err(Inconsistency::new(format!(
                "storage holds {} items, writer delivered {}",
                stored, state.items_delivered
            )));
        }
        Ok(())
    }
}

fn registry() -> CodecRegistry {
    let options = FormatOptions {
        csv: CsvOptions {
            fields: vec!["id".to_string(), "city".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    CodecRegistry::with_defaults(&options).unwrap()
}

fn unbounded() -> WriterConfig {
    WriterConfig {
        items_per_buffer_write: 0,
        size_per_buffer_write: 0,
        ..Default::default()
    }
}

fn writer(config: WriterConfig) -> BatchWriter<RecordingSink> {
    BatchWriter::new(config, registry(), Box::new(NoGrouper), RecordingSink::default()).unwrap()
}

fn jl_batch(range: std::ops::Range<i64>) -> Vec<Record> {
    range
        .map(|i| Record::from_value(Format::JsonLines, json!({"n": i})).unwrap())
        .collect()
}

#[test]
fn test_default_config_values() {
    let config = WriterConfig::default();
    assert_eq!(config.items_per_buffer_write, 500_000);
    assert_eq!(config.size_per_buffer_write, 4_000_000_000);
    assert_eq!(config.items_limit, 0);
    assert!(!config.check_consistency);
    assert_eq!(config.compression, Compression::Gz);
}

#[test]
fn test_invalid_config_fails_at_construction() {
    let config = WriterConfig {
        tmp_dir: Some(PathBuf::from("/definitely/not/a/dir")),
        ..Default::default()
    };
    let result = BatchWriter::new(config, registry(), Box::new(NoGrouper), RecordingSink::default());
    assert!(matches!(result, Err(WriterError::ConfigError(_))));
}

#[test]
fn test_quota_stops_mid_batch() {
    let mut writer = writer(WriterConfig {
        items_limit: 3,
        ..unbounded()
    });

    let outcome = writer.write_batch(&jl_batch(0..5)).unwrap();
    assert_eq!(outcome, BatchOutcome::QuotaReached { items: 3 });
    assert_eq!(writer.state().items_count, 3);
    assert_eq!(writer.buffer_stats().items_buffered, 3);

    // Further batches are refused without processing
    let outcome = writer.write_batch(&jl_batch(5..7)).unwrap();
    assert!(outcome.is_quota_reached());
    assert_eq!(writer.buffer_stats().items_buffered, 3);

    // Everything buffered before the limit survives the shutdown
    writer.flush().unwrap();
    writer.close().unwrap();
    let sink = writer.sink();
    assert_eq!(sink.deliveries.len(), 1);
    assert_eq!(sink.deliveries[0].1, "{\"n\":0}\n{\"n\":1}\n{\"n\":2}\n");
    assert_eq!(writer.state().items_delivered, 3);
}

#[test]
fn test_unlimited_quota_continues() {
    let mut writer = writer(unbounded());
    let outcome = writer.write_batch(&jl_batch(0..10)).unwrap();
    assert_eq!(outcome, BatchOutcome::Continue);
    assert_eq!(writer.state().items_count, 10);
}

#[test]
fn test_threshold_delivers_within_batch() {
    let mut writer = writer(WriterConfig {
        items_per_buffer_write: 2,
        ..unbounded()
    });

    writer.write_batch(&jl_batch(0..5)).unwrap();
    assert_eq!(writer.sink().deliveries.len(), 2);
    assert_eq!(writer.state().items_delivered, 4);
    assert_eq!(writer.grouping_info()[0].items, 1);

    writer.flush().unwrap();
    assert_eq!(writer.sink().deliveries.len(), 3);
    assert_eq!(writer.sink().deliveries[2].1, "{\"n\":4}\n");
}

#[test]
fn test_groups_flush_independently() {
    let mut writer = BatchWriter::new(
        WriterConfig {
            items_per_buffer_write: 2,
            ..unbounded()
        },
        registry(),
        Box::new(FieldGrouper::new(["g"])),
        RecordingSink::default(),
    )
    .unwrap();

    let batch: Vec<Record> = ["a", "b", "a"]
        .iter()
        .map(|g| Record::from_value(Format::JsonLines, json!({"g": g})).unwrap())
        .collect();
    writer.write_batch(&batch).unwrap();

    let sink = writer.sink();
    assert_eq!(sink.deliveries.len(), 1);
    assert_eq!(sink.deliveries[0].0, GroupKey::new(["a"]));

    let info = writer.grouping_info();
    let b = info.iter().find(|g| g.key == GroupKey::new(["b"])).unwrap();
    assert_eq!(b.items, 1);
}

#[test]
fn test_every_record_delivered_with_threshold_one() {
    let mut writer = BatchWriter::new(
        WriterConfig {
            items_per_buffer_write: 1,
            ..unbounded()
        },
        registry(),
        Box::new(FieldGrouper::new(["g"])),
        RecordingSink::default(),
    )
    .unwrap();

    let batch: Vec<Record> = ["a", "b"]
        .iter()
        .map(|g| Record::from_value(Format::JsonLines, json!({"g": g})).unwrap())
        .collect();
    writer.write_batch(&batch).unwrap();

    let memberships: Vec<&GroupKey> = writer.sink().deliveries.iter().map(|(k, _)| k).collect();
    assert_eq!(memberships, vec![&GroupKey::new(["a"]), &GroupKey::new(["b"])]);
    assert!(writer.grouping_info().iter().all(|g| g.items == 0));
}

#[test]
fn test_flush_then_close_loses_nothing() {
    let mut writer = BatchWriter::new(
        unbounded(),
        registry(),
        Box::new(FieldGrouper::new(["city"])),
        RecordingSink::default(),
    )
    .unwrap();

    let batch: Vec<Record> = (0..7)
        .map(|i| {
            let city = if i % 2 == 0 { "oslo" } else { "lima" };
            Record::from_value(Format::Csv, json!({"id": i, "city": city})).unwrap()
        })
        .collect();
    writer.write_batch(&batch).unwrap();
    assert!(writer.sink().deliveries.is_empty());

    writer.flush().unwrap();
    writer.close().unwrap();

    // Each CSV artifact carries a header line on top of its rows
    let sink = writer.sink();
    assert_eq!(sink.deliveries.len(), 2);
    assert_eq!(sink.delivered_lines() - 2, 7);
    assert_eq!(writer.state().items_delivered, writer.state().items_count);
    assert_eq!(sink.deliveries[0].1, "id,city\n0,oslo\n2,oslo\n4,oslo\n6,oslo\n");
}

#[test]
fn test_close_without_flush_delivers_nothing() {
    let mut writer = writer(unbounded());
    writer.write_batch(&jl_batch(0..3)).unwrap();
    writer.close().unwrap();

    assert!(writer.is_closed());
    assert!(writer.sink().deliveries.is_empty());
    assert_eq!(writer.buffer_stats().items_pending(), 3);
    assert!(matches!(
        writer.write_batch(&jl_batch(0..1)),
        Err(WriterError::Closed)
    ));
    // Second close is a no-op
    writer.close().unwrap();
}

#[test]
fn test_consistency_mismatch_is_fatal() {
    let sink = RecordingSink {
        reported_items: Some(1),
        ..Default::default()
    };
    let config = WriterConfig {
        check_consistency: true,
        ..unbounded()
    };
    let mut writer = BatchWriter::new(config, registry(), Box::new(NoGrouper), sink).unwrap();
    writer.write_batch(&jl_batch(0..4)).unwrap();
    writer.flush().unwrap();

    match writer.close() {
        Err(WriterError::Inconsistent(inconsistency)) => {
            assert!(inconsistency.details.contains("storage holds 1 items"));
        }
        other => panic!("expected inconsistency, got {:?}", other),
    }

    // Closing again reports the same failure
    match writer.close() {
        Err(WriterError::Inconsistent(inconsistency)) => {
            assert!(inconsistency.details.contains("storage holds 1 items"));
        }
        other => panic!("expected inconsistency, got {:?}", other),
    }
    assert!(writer.is_closed());
}

#[test]
fn test_consistency_check_passes_when_counts_match() {
    let config = WriterConfig {
        check_consistency: true,
        ..unbounded()
    };
    let mut writer = writer(config);
    writer.write_batch(&jl_batch(0..4)).unwrap();
    writer.flush().unwrap();
    writer.close().unwrap();
}

#[test]
fn test_disabled_consistency_check_only_notices() {
    let sink = RecordingSink {
        reported_items: Some(99),
        ..Default::default()
    };
    let mut writer = BatchWriter::new(unbounded(), registry(), Box::new(NoGrouper), sink).unwrap();
    writer.write_batch(&jl_batch(0..2)).unwrap();
    writer.flush().unwrap();
    assert!(writer.close().is_ok());
}

#[test]
fn test_delivery_failure_propagates_and_flush_retries() {
    let sink = RecordingSink {
        fail_next: true,
        ..Default::default()
    };
    let config = WriterConfig {
        items_per_buffer_write: 2,
        ..unbounded()
    };
    let mut writer = BatchWriter::new(config, registry(), Box::new(NoGrouper), sink).unwrap();

    let result = writer.write_batch(&jl_batch(0..2));
    assert!(matches!(result, Err(WriterError::DeliveryError(_))));
    assert_eq!(writer.state().items_delivered, 0);
    assert_eq!(writer.grouping_info()[0].items, 2);

    // The packed group is still held and goes out on the next flush
    writer.flush().unwrap();
    assert_eq!(writer.sink().deliveries.len(), 1);
    assert_eq!(writer.sink().deliveries[0].1, "{\"n\":0}\n{\"n\":1}\n");
    assert_eq!(writer.state().items_delivered, 2);
}

#[test]
fn test_unsupported_format_is_an_error() {
    let registry = CodecRegistry::with_defaults(&FormatOptions::default()).unwrap();
    let mut writer =
        BatchWriter::new(unbounded(), registry, Box::new(NoGrouper), RecordingSink::default())
            .unwrap();
    let record = Record::from_value(Format::Csv, json!({"id": 1})).unwrap();
    assert!(matches!(
        writer.write_batch(&[record]),
        Err(WriterError::BufferError(_))
    ));
    assert_eq!(writer.state().items_count, 0);
}

#[test]
fn test_config_from_toml() {
    let config: WriterConfig = toml::from_str(
        r#"
            items_per_buffer_write = 10
            size_per_buffer_write = 0
            items_limit = 100
            check_consistency = true
            compression = "zip"
        "#,
    )
    .unwrap();
    assert_eq!(config.items_per_buffer_write, 10);
    assert_eq!(config.size_per_buffer_write, 0);
    assert_eq!(config.items_limit, 100);
    assert!(config.check_consistency);
    assert_eq!(config.compression, Compression::Zip);

    let partial: WriterConfig = toml::from_str("items_limit = 5").unwrap();
    assert_eq!(partial.items_per_buffer_write, 500_000);

    assert!(toml::from_str::<WriterConfig>("items_limt = 5").is_err());
    assert!(toml::from_str::<WriterConfig>("items_limit = \"five\"").is_err());
}
