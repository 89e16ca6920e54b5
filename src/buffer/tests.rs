use super::*;
use crate::codec::{CodecRegistry, CsvOptions, FormatOptions};
use crate::grouper::{FieldGrouper, NoGrouper};
use crate::record::{Format, GroupKey, Record};
use flate2::read::GzDecoder;
use serde_json::json;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tempfile::tempdir;

fn registry() -> CodecRegistry {
    let options = FormatOptions {
        csv: CsvOptions {
            fields: vec!["id".to_string(), "name".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    CodecRegistry::with_defaults(&options).unwrap()
}

fn buffer_with(thresholds: Thresholds) -> WriteBuffer {
    let config = BufferConfig {
        thresholds,
        ..Default::default()
    };
    WriteBuffer::new(config, registry(), Box::new(NoGrouper)).unwrap()
}

fn jl(value: serde_json::Value) -> Record {
    Record::from_value(Format::JsonLines, value).unwrap()
}

fn read_gz(path: &Path) -> String {
    let mut content = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[test]
fn test_count_threshold_fires_at_nth_record() {
    let mut buffer = buffer_with(Thresholds::items(3));
    let key = GroupKey::default();

    buffer.buffer(&jl(json!({"n": 1}))).unwrap();
    assert!(!buffer.should_write_buffer(&key));
    buffer.buffer(&jl(json!({"n": 2}))).unwrap();
    assert!(!buffer.should_write_buffer(&key));
    buffer.buffer(&jl(json!({"n": 3}))).unwrap();
    assert!(buffer.should_write_buffer(&key));
}

#[test]
fn test_size_threshold_fires_when_size_first_reached() {
    let record = jl(json!({"v": "aaaa"}));
    let line_len = serde_json::to_string(&record.fields).unwrap().len() as u64 + 1;

    let mut buffer = buffer_with(Thresholds::size(2 * line_len + 1));
    let key = GroupKey::default();
    buffer.buffer(&record).unwrap();
    buffer.buffer(&record).unwrap();
    assert!(!buffer.should_write_buffer(&key));
    buffer.buffer(&record).unwrap();
    assert!(buffer.should_write_buffer(&key));
    assert_eq!(buffer.group(&key).unwrap().bytes(), 3 * line_len);

    // Reaching the threshold exactly also counts
    let mut buffer = buffer_with(Thresholds::size(2 * line_len));
    buffer.buffer(&record).unwrap();
    assert!(!buffer.should_write_buffer(&key));
    buffer.buffer(&record).unwrap();
    assert!(buffer.should_write_buffer(&key));
}

#[test]
fn test_disabled_thresholds_never_fire() {
    let mut buffer = buffer_with(Thresholds::disabled());
    for i in 0..100 {
        buffer.buffer(&jl(json!({"i": i}))).unwrap();
    }
    assert!(!buffer.should_write_buffer(&GroupKey::default()));
}

#[test]
fn test_should_write_unknown_group_is_false() {
    let buffer = buffer_with(Thresholds::items(1));
    assert!(!buffer.should_write_buffer(&GroupKey::new(["nope"])));
}

#[test]
fn test_repeated_pack_produces_independent_artifacts() {
    let mut buffer = buffer_with(Thresholds::disabled());
    let key = GroupKey::default();
    buffer.buffer(&jl(json!({"a": 1}))).unwrap();
    buffer.buffer(&jl(json!({"a": 2}))).unwrap();

    let first = buffer.pack_buffer(&key).unwrap();
    let second = buffer.pack_buffer(&key).unwrap();

    assert_ne!(first.path, second.path);
    assert_eq!(first.items, 2);
    assert_eq!(second.items, 2);
    assert_eq!(read_gz(&first.path), "{\"a\":1}\n{\"a\":2}\n");
    assert_eq!(read_gz(&first.path), read_gz(&second.path));
    assert_eq!(buffer.stats().artifacts_packed, 2);

    // Packing does not touch the counts
    let entry = buffer.group(&key).unwrap();
    assert_eq!(entry.items(), 2);
    assert!(entry.is_packed());
}

#[test]
fn test_finish_write_resets_entry_and_removes_files() {
    let mut buffer = buffer_with(Thresholds::disabled());
    let key = GroupKey::default();
    buffer.buffer(&jl(json!({"a": 1}))).unwrap();

    let first = buffer.pack_buffer(&key).unwrap();
    let packed = buffer.pack_buffer(&key).unwrap();
    buffer.finish_write(&key, &packed.path).unwrap();

    assert!(!first.path.exists());
    assert!(!packed.path.exists());
    let entry = buffer.group(&key).unwrap();
    assert_eq!(entry.items(), 0);
    assert_eq!(entry.bytes(), 0);
    assert!(entry.is_empty());
    assert!(!entry.is_packed());

    // Only the scratch directory itself remains
    let scratch = buffer.scratch_dir().unwrap();
    assert_eq!(fs::read_dir(scratch).unwrap().count(), 0);

    // The same key starts a new cycle
    buffer.buffer(&jl(json!({"a": 2}))).unwrap();
    assert_eq!(buffer.group(&key).unwrap().items(), 1);
    let packed = buffer.pack_buffer(&key).unwrap();
    assert_eq!(read_gz(&packed.path), "{\"a\":2}\n");

    let stats = buffer.stats();
    assert_eq!(stats.items_buffered, 2);
    assert_eq!(stats.items_flushed, 1);
    assert_eq!(stats.items_pending(), 1);
    assert_eq!(stats.groups, 1);
}

#[test]
fn test_groups_are_independent() {
    let config = BufferConfig {
        thresholds: Thresholds::items(2),
        ..Default::default()
    };
    let mut buffer =
        WriteBuffer::new(config, registry(), Box::new(FieldGrouper::new(["g"]))).unwrap();
    let a = GroupKey::new(["a"]);
    let b = GroupKey::new(["b"]);

    buffer.buffer(&jl(json!({"g": "a"}))).unwrap();
    buffer.buffer(&jl(json!({"g": "b"}))).unwrap();
    buffer.buffer(&jl(json!({"g": "a"}))).unwrap();

    assert!(buffer.should_write_buffer(&a));
    assert!(!buffer.should_write_buffer(&b));

    let packed = buffer.pack_buffer(&a).unwrap();
    assert_eq!(packed.membership, a);
    buffer.finish_write(&a, &packed.path).unwrap();

    assert_eq!(buffer.group(&a).unwrap().items(), 0);
    assert_eq!(buffer.group(&b).unwrap().items(), 1);
    assert_eq!(buffer.pending_keys(), vec![b.clone()]);

    let info = buffer.grouping_info();
    assert_eq!(info.len(), 2);
    assert_eq!(info[0].key, a);
    assert_eq!(info[1].key, b);
    assert_eq!(info[1].items, 1);
}

#[test]
fn test_csv_group_roundtrip_through_zip() {
    let config = BufferConfig {
        thresholds: Thresholds::disabled(),
        compression: Compression::Zip,
        ..Default::default()
    };
    let mut buffer = WriteBuffer::new(config, registry(), Box::new(NoGrouper)).unwrap();
    let key = GroupKey::default();
    buffer
        .buffer(&Record::from_value(Format::Csv, json!({"id": 1, "name": "x"})).unwrap())
        .unwrap();

    let packed = buffer.pack_buffer(&key).unwrap();
    assert!(packed.path.to_string_lossy().ends_with(".csv.zip"));

    let mut archive = zip::ZipArchive::new(File::open(&packed.path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    let mut content = String::new();
    archive.by_index(0).unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "id,name\n1,x\n");
}

#[test]
fn test_uncompressed_artifact() {
    let config = BufferConfig {
        compression: Compression::None,
        ..Default::default()
    };
    let mut buffer = WriteBuffer::new(config, registry(), Box::new(NoGrouper)).unwrap();
    buffer.buffer(&jl(json!({"k": "v"}))).unwrap();

    let packed = buffer.pack_buffer(&GroupKey::default()).unwrap();
    assert!(packed.path.to_string_lossy().ends_with(".jl"));
    assert_eq!(fs::read_to_string(&packed.path).unwrap(), "{\"k\":\"v\"}\n");
}

#[test]
fn test_unsupported_and_mismatched_formats() {
    let config = BufferConfig::default();
    let registry = CodecRegistry::with_defaults(&FormatOptions::default()).unwrap();
    let mut buffer = WriteBuffer::new(config, registry, Box::new(NoGrouper)).unwrap();

    let csv = Record::from_value(Format::Csv, json!({"id": 1})).unwrap();
    assert!(matches!(
        buffer.buffer(&csv),
        Err(BufferError::UnsupportedFormat(Format::Csv))
    ));

    buffer.buffer(&jl(json!({"id": 1}))).unwrap();
    let xml = Record::from_value(Format::Xml, json!({"id": 1})).unwrap();
    assert!(matches!(
        buffer.buffer(&xml),
        Err(BufferError::FormatMismatch { .. })
    ));
    assert_eq!(buffer.stats().items_buffered, 1);
}

#[test]
fn test_lifecycle_misuse_is_rejected() {
    let mut buffer = buffer_with(Thresholds::disabled());
    let key = GroupKey::default();

    assert!(matches!(
        buffer.pack_buffer(&key),
        Err(BufferError::UnknownGroup(_))
    ));

    buffer.buffer(&jl(json!({"a": 1}))).unwrap();
    assert!(matches!(
        buffer.finish_write(&key, Path::new("/nonexistent")),
        Err(BufferError::NotPacked(_))
    ));

    let packed = buffer.pack_buffer(&key).unwrap();
    assert!(matches!(
        buffer.buffer(&jl(json!({"a": 2}))),
        Err(BufferError::GroupPacked(_))
    ));

    buffer.finish_write(&key, &packed.path).unwrap();
    assert!(matches!(
        buffer.pack_buffer(&key),
        Err(BufferError::EmptyGroup(_))
    ));
}

#[test]
fn test_close_is_idempotent_and_removes_scratch_dir() {
    let mut buffer = buffer_with(Thresholds::disabled());
    let key = GroupKey::default();
    buffer.buffer(&jl(json!({"a": 1}))).unwrap();
    let packed = buffer.pack_buffer(&key).unwrap();
    let scratch = buffer.scratch_dir().unwrap().to_path_buf();

    buffer.close();
    assert!(buffer.is_closed());
    assert!(!scratch.exists());
    assert!(!packed.path.exists());
    assert!(buffer.group(&key).unwrap().is_empty());

    buffer.close();
    assert!(matches!(
        buffer.buffer(&jl(json!({"a": 2}))),
        Err(BufferError::Closed)
    ));
}

#[test]
fn test_drop_removes_scratch_dir() {
    let parent = tempdir().unwrap();
    let config = BufferConfig {
        tmp_dir: Some(parent.path().to_path_buf()),
        ..Default::default()
    };
    let mut buffer = WriteBuffer::new(config, registry(), Box::new(NoGrouper)).unwrap();
    buffer.buffer(&jl(json!({"a": 1}))).unwrap();
    let scratch = buffer.scratch_dir().unwrap().to_path_buf();
    assert!(scratch.starts_with(parent.path()));

    drop(buffer);
    assert!(!scratch.exists());
    assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
}

#[test]
fn test_compression_from_str() {
    assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gz);
    assert_eq!("zip".parse::<Compression>().unwrap(), Compression::Zip);
    assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
    assert!("bz2".parse::<Compression>().is_err());
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A threshold fires exactly when either enabled dimension is reached
        #[test]
        fn test_threshold_arithmetic(
            items_limit in 0u64..50,
            size_limit in 0u64..5_000,
            items in 0u64..100,
            bytes in 0u64..10_000,
        ) {
            let thresholds = Thresholds {
                items_per_buffer_write: items_limit,
                size_per_buffer_write: size_limit,
            };
            let expected = (items_limit > 0 && items >= items_limit)
                || (size_limit > 0 && bytes >= size_limit);
            prop_assert_eq!(thresholds.is_reached(items, bytes), expected);
        }

        /// Count-only thresholds fire on exactly the Nth record of a group
        #[test]
        fn test_count_threshold_first_fires_at_n(n in 1u64..20) {
            let thresholds = Thresholds::items(n);
            let first = (1..=n + 5).find(|&count| thresholds.is_reached(count, 0));
            prop_assert_eq!(first, Some(n));
        }
    }
}
