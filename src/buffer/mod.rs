//! # Write Buffer Module
//!
//! The grouping engine at the core of an export job. Records are routed to a
//! per-key [`GroupEntry`] by a [`Grouper`](crate::grouper::Grouper), appended
//! to that group's temp container through its format codec, and counted.
//!
//! ## Group Lifecycle
//!
//! ```text
//! empty ──buffer──▶ open ──pack_buffer──▶ finalized ──finish_write──▶ empty
//!                    ▲ │                    │   ▲
//!                    └─┘ buffer             └───┘ pack_buffer (repack)
//! ```
//!
//! 1. **Buffer**: the first record opens a container named after the group's
//!    ordinal and cycle; every record adds to the group's item and byte counts.
//! 2. **Threshold check**: [`WriteBuffer::should_write_buffer`] compares those
//!    counts against [`Thresholds`] after each record.
//! 3. **Pack**: the container is finalized once and compressed into a fresh
//!    artifact on every call, so a failed delivery can simply pack again.
//! 4. **Finish**: after the sink confirms delivery, temp files are removed and
//!    the entry starts a new cycle under the same key.
//!
//! Closing (or dropping) the buffer removes every remaining container and the
//! scratch directory without delivering anything.

mod compression;
mod config;
mod entry;
mod error;
mod stats;
mod write_buffer;

#[cfg(test)]
mod tests;

pub use config::{
    BufferConfig, Compression, Thresholds, ITEMS_PER_BUFFER_WRITE, SIZE_PER_BUFFER_WRITE,
};
pub use entry::{GroupEntry, GroupInfo};
pub use error::BufferError;
pub use stats::BufferStats;
pub use write_buffer::{PackedBuffer, WriteBuffer};
