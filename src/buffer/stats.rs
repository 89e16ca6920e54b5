use std::fmt;

/// Running counters of a write buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Records appended to any group
    pub items_buffered: u64,
    /// Bytes reported by codecs for appended records
    pub bytes_buffered: u64,
    /// Records whose group was delivered and finished
    pub items_flushed: u64,
    /// Bytes whose group was delivered and finished
    pub bytes_flushed: u64,
    /// Artifacts produced by packing, including repeated packs
    pub artifacts_packed: u64,
    /// Distinct group keys seen
    pub groups: usize,
}

impl BufferStats {
    /// Records buffered but not yet flushed
    pub fn items_pending(&self) -> u64 {
        self.items_buffered - self.items_flushed
    }
}

impl fmt::Display for BufferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Buffered {} items ({} bytes) in {} group(s); flushed {} items ({} bytes) in {} artifact(s)",
            self.items_buffered,
            self.bytes_buffered,
            self.groups,
            self.items_flushed,
            self.bytes_flushed,
            self.artifacts_packed
        )
    }
}
