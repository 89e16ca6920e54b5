use log::{debug, info, warn};

use crate::buffer::{BufferStats, GroupInfo, WriteBuffer};
use crate::codec::CodecRegistry;
use crate::grouper::Grouper;
use crate::record::{GroupKey, Record};

use super::config::WriterConfig;
use super::error::{Inconsistency, WriterError};
use super::sink::Sink;
use super::stats::{BatchOutcome, WriterState};

/// Drives batches of records through a [`WriteBuffer`] and hands packed
/// groups to a [`Sink`]
pub struct BatchWriter<S: Sink> {
    sink: S,
    buffer: WriteBuffer,
    config: WriterConfig,
    state: WriterState,
    closed: bool,
    inconsistency: Option<Inconsistency>,
}

impl<S: Sink> BatchWriter<S> {
    /// Create a writer.
    ///
    /// The configuration is validated and the buffer's scratch directory is
    /// created here, before any record is seen.
    pub fn new(
        config: WriterConfig,
        registry: CodecRegistry,
        grouper: Box<dyn Grouper>,
        sink: S,
    ) -> Result<Self, WriterError> {
        config.validate()?;
        let buffer = WriteBuffer::new(config.buffer_config(), registry, grouper)?;
        debug!("Batch writer created: {:?}", config);

        Ok(Self {
            sink,
            buffer,
            config,
            state: WriterState::default(),
            closed: false,
            inconsistency: None,
        })
    }

    /// Buffer every record of `batch`, delivering groups as they cross a
    /// threshold.
    ///
    /// The item limit is checked after each record. Once it is reached the
    /// rest of the batch is left unprocessed and
    /// [`BatchOutcome::QuotaReached`] is returned; later calls return it again
    /// without processing anything.
    pub fn write_batch(&mut self, batch: &[Record]) -> Result<BatchOutcome, WriterError> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        if self.quota_reached() {
            return Ok(self.quota_outcome());
        }

        for record in batch {
            self.buffer.buffer(record)?;
            let key = self.buffer.key_for(record);
            if self.buffer.should_write_buffer(&key) {
                self.write_group(&key)?;
            }
            self.state.items_count += 1;

            if self.quota_reached() {
                info!(
                    "Finishing job after items_limit reached: {} items written.",
                    self.state.items_count
                );
                return Ok(self.quota_outcome());
            }
        }

        Ok(BatchOutcome::Continue)
    }

    /// Deliver every group holding records, regardless of thresholds
    pub fn flush(&mut self) -> Result<(), WriterError> {
        if self.closed {
            return Err(WriterError::Closed);
        }
        for key in self.buffer.pending_keys() {
            self.write_group(&key)?;
        }
        Ok(())
    }

    /// Release remaining containers, then run the consistency check if
    /// enabled.
    ///
    /// Nothing is delivered here; call [`flush`](Self::flush) first to keep
    /// buffered records. Calling close again does no further work but
    /// returns the same consistency failure, if there was one.
    pub fn close(&mut self) -> Result<(), WriterError> {
        if self.closed {
            return match &self.inconsistency {
                Some(inconsistency) => Err(inconsistency.clone().into()),
                None => Ok(()),
            };
        }
        self.closed = true;

        let pending = self.buffer.stats().items_pending();
        if pending > 0 {
            warn!("Closing writer with {} undelivered items", pending);
        }
        self.buffer.close();
        info!("{}", self.buffer.stats());
        info!("{}", self.state);

        if self.config.check_consistency {
            if let Err(inconsistency) = self.sink.check_consistency(&self.state) {
                self.inconsistency = Some(inconsistency.clone());
                return Err(inconsistency.into());
            }
            info!("Write consistency check passed");
        } else {
            warn!("Not checking write consistency");
        }
        Ok(())
    }

    /// Per-instance counters
    pub fn state(&self) -> &WriterState {
        &self.state
    }

    /// Buffer counters for reporting
    pub fn buffer_stats(&self) -> &BufferStats {
        self.buffer.stats()
    }

    /// Snapshot of every group
    pub fn grouping_info(&self) -> Vec<GroupInfo> {
        self.buffer.grouping_info()
    }

    /// Writer configuration
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// The sink artifacts are delivered to
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// True once [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn quota_reached(&self) -> bool {
        self.config.items_limit != 0 && self.state.items_count >= self.config.items_limit
    }

    fn quota_outcome(&self) -> BatchOutcome {
        BatchOutcome::QuotaReached {
            items: self.state.items_count,
        }
    }

    /// Pack, deliver, then clean up one group.
    ///
    /// Cleanup runs only after the sink confirms delivery; on failure the
    /// packed group stays in place and the error propagates.
    fn write_group(&mut self, key: &GroupKey) -> Result<(), WriterError> {
        let packed = self.buffer.pack_buffer(key)?;
        self.sink.deliver(&packed.path, &packed.membership)?;
        self.buffer.finish_write(key, &packed.path)?;
        self.state.record_delivery(packed.items);
        debug!(
            "Delivered group {} ({} items, {} bytes on disk)",
            key, packed.items, packed.size_on_disk
        );
        Ok(())
    }
}

impl<S: Sink> std::fmt::Debug for BatchWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchWriter")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("buffer", &self.buffer)
            .field("closed", &self.closed)
            .finish()
    }
}
