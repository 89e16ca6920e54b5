use std::fmt;

/// Running counters owned by one writer instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterState {
    /// Records processed by `write_batch`
    pub items_count: u64,
    /// Records contained in delivered artifacts
    pub items_delivered: u64,
    /// Artifacts the sink confirmed
    pub artifacts_delivered: u64,
}

impl WriterState {
    pub(super) fn record_delivery(&mut self, items: u64) {
        self.items_delivered += items;
        self.artifacts_delivered += 1;
    }
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} items; delivered {} items in {} artifact(s)",
            self.items_count, self.items_delivered, self.artifacts_delivered
        )
    }
}

/// Result of a `write_batch` call that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every record was processed; keep feeding batches
    Continue,
    /// The item limit was reached. The caller must stop feeding batches and
    /// proceed to `flush` then `close`.
    QuotaReached {
        /// Items processed when the limit was hit
        items: u64,
    },
}

impl BatchOutcome {
    /// True for [`BatchOutcome::QuotaReached`]
    pub fn is_quota_reached(&self) -> bool {
        matches!(self, Self::QuotaReached { .. })
    }
}
