use std::path::{Path, PathBuf};

use crate::codec::Container;
use crate::record::{Format, GroupKey};

/// Lifecycle of a group's temp container
#[derive(Debug, Default)]
pub(super) enum ContainerState {
    /// Nothing buffered since creation or the last finished write
    #[default]
    Empty,
    /// Accepting records
    Open {
        container: Container,
        format: Format,
    },
    /// Footer written and handle released; ready to be packed (again)
    Finalized { path: PathBuf, format: Format },
}

/// Accumulating container plus counters for one group key.
///
/// Only the write buffer mutates entries; everything else sees them through
/// the read-only accessors.
#[derive(Debug)]
pub struct GroupEntry {
    ordinal: usize,
    cycle: u64,
    membership: GroupKey,
    pub(super) state: ContainerState,
    pub(super) items: u64,
    pub(super) bytes: u64,
    pub(super) artifacts: Vec<PathBuf>,
}

impl GroupEntry {
    pub(super) fn new(ordinal: usize, membership: GroupKey) -> Self {
        Self {
            ordinal,
            cycle: 0,
            membership,
            state: ContainerState::Empty,
            items: 0,
            bytes: 0,
            artifacts: Vec::new(),
        }
    }

    /// Deterministic container path for the current cycle
    pub(super) fn container_path(&self, dir: &Path, format: Format) -> PathBuf {
        dir.join(format!(
            "group-{:05}-{:04}.{}",
            self.ordinal,
            self.cycle,
            format.extension()
        ))
    }

    /// Start a fresh cycle after a finished write
    pub(super) fn reset(&mut self) {
        self.state = ContainerState::Empty;
        self.items = 0;
        self.bytes = 0;
        self.artifacts.clear();
        self.cycle += 1;
    }

    /// Membership value handed to sinks
    pub fn membership(&self) -> &GroupKey {
        &self.membership
    }

    /// Records buffered in the current cycle
    pub fn items(&self) -> u64 {
        self.items
    }

    /// Bytes buffered in the current cycle
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Format of the current container, if any records are buffered
    pub fn format(&self) -> Option<Format> {
        match self.state {
            ContainerState::Empty => None,
            ContainerState::Open { format, .. } | ContainerState::Finalized { format, .. } => {
                Some(format)
            }
        }
    }

    /// True when no records are buffered
    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// True when the container is finalized and waiting for delivery
    pub fn is_packed(&self) -> bool {
        matches!(self.state, ContainerState::Finalized { .. })
    }

    /// Artifacts produced by packing in the current cycle
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Creation order of this group
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Snapshot of one group for reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group key
    pub key: GroupKey,
    /// Membership value handed to sinks
    pub membership: GroupKey,
    /// Records buffered in the current cycle
    pub items: u64,
    /// Bytes buffered in the current cycle
    pub bytes: u64,
}
