//! # exportbuf - Grouped, Threshold-Triggered Batch Writing
//!
//! `exportbuf` is the write path of a batch data-export job. Records arrive in
//! batches, are routed to a group by a [`Grouper`](grouper::Grouper), appended
//! to that group's temp file through a format [`Codec`](codec::Codec), and
//! handed to a [`Sink`](writer::Sink) as a compressed artifact once the group
//! crosses an item-count or byte-size threshold.
//!
//! ## Key Features
//!
//! - **Grouped buffering**: one accumulating container per group key, each
//!   flushed independently of the others.
//!
//! - **Unified thresholds**: deliver a group after N items or B bytes,
//!   whichever comes first; either dimension can be disabled with `0`.
//!
//! - **Pluggable formats**: JSON lines, CSV and XML codecs, selected per
//!   record through a registry resolved once at construction.
//!
//! - **Safe delivery**: temp files are removed only after the sink confirms
//!   the artifact is durable, and every temp file is released on close or
//!   drop.
//!
//! - **Quota**: an item limit stops a job cleanly with
//!   [`BatchOutcome::QuotaReached`](writer::BatchOutcome::QuotaReached)
//!   instead of an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exportbuf::prelude::*;
//! use serde_json::json;
//!
//! let registry = CodecRegistry::with_defaults(&FormatOptions::default())?;
//! let sink = DirectorySink::new("export")?;
//! let mut writer = BatchWriter::new(
//!     WriterConfig::default(),
//!     registry,
//!     Box::new(FieldGrouper::new(["country"])),
//!     sink,
//! )?;
//!
//! let batch: Vec<Record> = [json!({"country": "es", "name": "a"})]
//!     .into_iter()
//!     .filter_map(|value| Record::from_value(Format::JsonLines, value))
//!     .collect();
//!
//! if writer.write_batch(&batch)?.is_quota_reached() {
//!     println!("item limit reached");
//! }
//! writer.flush()?;
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! This delivers one artifact per group:
//! ```text
//! export/
//! └── es/group-00000-0000-<uuid>.jl.gz
//! ```

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod codec;
pub mod grouper;
pub mod record;
pub mod sinks;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::buffer::{
        BufferConfig, BufferError, BufferStats, Compression, GroupInfo, PackedBuffer, Thresholds,
        WriteBuffer,
    };
    pub use crate::codec::{Codec, CodecError, CodecRegistry, CsvOptions, FormatOptions, XmlOptions};
    pub use crate::grouper::{grouper_for_fields, FieldGrouper, Grouper, NoGrouper};
    pub use crate::record::{Format, GroupKey, Record};
    pub use crate::sinks::DirectorySink;
    pub use crate::writer::{
        BatchOutcome, BatchWriter, Inconsistency, Sink, SinkError, WriterConfig, WriterError,
        WriterState,
    };
}
