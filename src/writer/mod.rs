//! # Batch Writer Module
//!
//! The orchestrating half of the pipeline. A [`BatchWriter`] feeds each record
//! of a batch into the write buffer, delivers any group that crossed a
//! threshold through its [`Sink`], and counts processed items against the
//! configured limit.
//!
//! ## Outcomes
//!
//! `write_batch` returns a checked outcome instead of signalling the item
//! limit through an error:
//!
//! - `Ok(BatchOutcome::Continue)`: keep feeding batches
//! - `Ok(BatchOutcome::QuotaReached { items })`: stop feeding, then `flush`
//!   and `close`; nothing buffered is lost
//! - `Err(WriterError::DeliveryError(_))`: the sink failed; the packed group is
//!   kept so a later `flush` can retry it
//!
//! `close` surfaces `WriterError::Inconsistent` when the enabled consistency
//! check finds a mismatch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use exportbuf::codec::{CodecRegistry, FormatOptions};
//! use exportbuf::grouper::FieldGrouper;
//! use exportbuf::record::{Format, Record};
//! use exportbuf::sinks::DirectorySink;
//! use exportbuf::writer::{BatchOutcome, BatchWriter, WriterConfig};
//!
//! let config = WriterConfig {
//!     items_per_buffer_write: 1_000,
//!     items_limit: 10_000,
//!     ..Default::default()
//! };
//! let registry = CodecRegistry::with_defaults(&FormatOptions::default())?;
//! let sink = DirectorySink::new("export")?;
//! let mut writer = BatchWriter::new(config, registry, Box::new(FieldGrouper::new(["date"])), sink)?;
//!
//! let record = Record::from_value(Format::JsonLines, serde_json::json!({"date": "2024-01-01"}))
//!     .expect("object");
//! if let BatchOutcome::QuotaReached { items } = writer.write_batch(&[record])? {
//!     println!("stopped after {} items", items);
//! }
//!
//! writer.flush()?;
//! writer.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod config;
mod error;
mod sink;
mod stats;
mod writer_impl;

#[cfg(test)]
mod tests;

pub use config::WriterConfig;
pub use error::{Inconsistency, SinkError, WriterError};
pub use sink::Sink;
pub use stats::{BatchOutcome, WriterState};
pub use writer_impl::BatchWriter;
