use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use tempfile::TempDir;
use uuid::Uuid;

use crate::codec::CodecRegistry;
use crate::grouper::Grouper;
use crate::record::{GroupKey, Record};

use super::compression::{pack_file, remove_if_exists};
use super::config::BufferConfig;
use super::entry::{ContainerState, GroupEntry, GroupInfo};
use super::error::BufferError;
use super::stats::BufferStats;

/// A finalized, compressed group ready to be handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBuffer {
    /// Path of the packed artifact
    pub path: PathBuf,
    /// Membership value for the sink
    pub membership: GroupKey,
    /// Records contained in the artifact
    pub items: u64,
    /// Uncompressed record bytes contained in the artifact
    pub bytes: u64,
    /// Size of the artifact on disk
    pub size_on_disk: u64,
}

/// Grouping engine: one accumulating container per group key.
///
/// Containers live in a private scratch directory that is removed when the
/// buffer is closed or dropped, so no temp file outlives the buffer.
pub struct WriteBuffer {
    config: BufferConfig,
    registry: CodecRegistry,
    grouper: Box<dyn Grouper>,
    workdir: Option<TempDir>,
    entries: HashMap<GroupKey, GroupEntry>,
    stats: BufferStats,
}

impl WriteBuffer {
    /// Create a buffer and its scratch directory
    pub fn new(
        config: BufferConfig,
        registry: CodecRegistry,
        grouper: Box<dyn Grouper>,
    ) -> Result<Self, BufferError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("exportbuf-");
        let workdir = match &config.tmp_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!("Write buffer scratch directory: {}", workdir.path().display());

        Ok(Self {
            config,
            registry,
            grouper,
            workdir: Some(workdir),
            entries: HashMap::new(),
            stats: BufferStats::default(),
        })
    }

    /// Group key for `record`
    pub fn key_for(&self, record: &Record) -> GroupKey {
        self.grouper.key_for(record)
    }

    /// Append `record` to its group, opening the group's container if needed
    pub fn buffer(&mut self, record: &Record) -> Result<(), BufferError> {
        let key = self.grouper.key_for(record);
        let dir = self.workdir.as_ref().ok_or(BufferError::Closed)?.path();
        let codec = self
            .registry
            .get(record.format)
            .ok_or(BufferError::UnsupportedFormat(record.format))?;

        let next_ordinal = self.entries.len();
        let entry = match self.entries.entry(key) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let membership = vacant.key().clone();
                self.stats.groups += 1;
                vacant.insert(GroupEntry::new(next_ordinal, membership))
            }
        };

        if let Some(expected) = entry.format() {
            if expected != record.format {
                return Err(BufferError::FormatMismatch {
                    key: entry.membership().clone(),
                    expected,
                    actual: record.format,
                });
            }
        }

        let bytes = match &mut entry.state {
            ContainerState::Open { container, .. } => codec.append(container, record)?,
            ContainerState::Finalized { .. } => {
                return Err(BufferError::GroupPacked(entry.membership().clone()));
            }
            ContainerState::Empty => {
                let path = entry.container_path(dir, record.format);
                let mut container = codec.open(&path)?;
                match codec.append(&mut container, record) {
                    Ok(bytes) => {
                        entry.state = ContainerState::Open {
                            container,
                            format: record.format,
                        };
                        bytes
                    }
                    Err(e) => {
                        drop(container);
                        discard_file(&path);
                        return Err(e.into());
                    }
                }
            }
        };

        entry.items += 1;
        entry.bytes += bytes;
        self.stats.items_buffered += 1;
        self.stats.bytes_buffered += bytes;
        Ok(())
    }

    /// True when the group has reached either enabled threshold
    pub fn should_write_buffer(&self, key: &GroupKey) -> bool {
        self.entries
            .get(key)
            .map(|entry| self.config.thresholds.is_reached(entry.items, entry.bytes))
            .unwrap_or(false)
    }

    /// Finalize the group's container and compress it into a new artifact.
    ///
    /// Item and byte counts are left untouched; calling this again before
    /// [`finish_write`](Self::finish_write) produces another complete artifact
    /// from the same finalized container.
    pub fn pack_buffer(&mut self, key: &GroupKey) -> Result<PackedBuffer, BufferError> {
        let dir = self.workdir.as_ref().ok_or(BufferError::Closed)?.path();
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| BufferError::UnknownGroup(key.clone()))?;
        if entry.is_empty() {
            return Err(BufferError::EmptyGroup(key.clone()));
        }

        finalize_container(&self.registry, entry)?;
        let (source, format) = match &entry.state {
            ContainerState::Finalized { path, format } => (path.clone(), *format),
            _ => return Err(BufferError::EmptyGroup(key.clone())),
        };

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("group-{:05}", entry.ordinal()));
        let mut name = format!("{}-{}.{}", stem, Uuid::new_v4().simple(), format.extension());
        if let Some(ext) = self.config.compression.extension() {
            name.push('.');
            name.push_str(ext);
        }
        let artifact = dir.join(name);

        let size_on_disk = match pack_file(&source, &artifact, self.config.compression) {
            Ok(size) => size,
            Err(e) => {
                discard_file(&artifact);
                return Err(e);
            }
        };
        entry.artifacts.push(artifact.clone());
        self.stats.artifacts_packed += 1;

        debug!(
            "Packed group {} ({} items, {} bytes) into {} ({} bytes)",
            key,
            entry.items,
            entry.bytes,
            artifact.display(),
            size_on_disk
        );

        Ok(PackedBuffer {
            path: artifact,
            membership: entry.membership().clone(),
            items: entry.items,
            bytes: entry.bytes,
            size_on_disk,
        })
    }

    /// Remove the group's temp files and reset it for a new cycle.
    ///
    /// Call only once the sink has confirmed durable delivery of `artifact`.
    pub fn finish_write(&mut self, key: &GroupKey, artifact: &Path) -> Result<(), BufferError> {
        let dir = self.workdir.as_ref().ok_or(BufferError::Closed)?.path();
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| BufferError::UnknownGroup(key.clone()))?;
        let source = match &entry.state {
            ContainerState::Finalized { path, .. } => path.clone(),
            _ => return Err(BufferError::NotPacked(key.clone())),
        };

        discard_file(&source);
        for packed in entry.artifacts.drain(..) {
            discard_file(&packed);
        }
        // The sink may have been handed a copy we do not track
        if artifact.starts_with(dir) {
            discard_file(artifact);
        }

        self.stats.items_flushed += entry.items;
        self.stats.bytes_flushed += entry.bytes;
        debug!(
            "Finished write of group {} ({} items, {} bytes)",
            key, entry.items, entry.bytes
        );
        entry.reset();
        Ok(())
    }

    /// Release every container without delivering it.
    ///
    /// Safe to call repeatedly; cleanup failures are logged, never returned.
    pub fn close(&mut self) {
        let Some(workdir) = self.workdir.take() else {
            return;
        };

        let mut discarded = 0;
        let mut entries: Vec<&mut GroupEntry> = self.entries.values_mut().collect();
        entries.sort_by_key(|entry| entry.ordinal());
        for entry in entries {
            match std::mem::take(&mut entry.state) {
                ContainerState::Open { container, .. } => {
                    let path = container.path().to_path_buf();
                    drop(container);
                    discard_file(&path);
                }
                ContainerState::Finalized { path, .. } => discard_file(&path),
                ContainerState::Empty => {}
            }
            for packed in entry.artifacts.drain(..) {
                discard_file(&packed);
            }
            if !entry.is_empty() {
                warn!(
                    "Discarding {} undelivered items of group {}",
                    entry.items,
                    entry.membership()
                );
                discarded += entry.items;
            }
            entry.reset();
        }

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            warn!(
                "Failed to remove scratch directory {}: {}",
                path.display(),
                e
            );
        }
        debug!(
            "Write buffer closed ({} groups, {} items discarded)",
            self.entries.len(),
            discarded
        );
    }

    /// True once [`close`](Self::close) has run
    pub fn is_closed(&self) -> bool {
        self.workdir.is_none()
    }

    /// Scratch directory holding containers and artifacts
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|dir| dir.path())
    }

    /// Read-only view of one group
    pub fn group(&self, key: &GroupKey) -> Option<&GroupEntry> {
        self.entries.get(key)
    }

    /// Keys of groups holding buffered records, in creation order
    pub fn pending_keys(&self) -> Vec<GroupKey> {
        let mut pending: Vec<&GroupEntry> =
            self.entries.values().filter(|entry| !entry.is_empty()).collect();
        pending.sort_by_key(|entry| entry.ordinal());
        pending
            .into_iter()
            .map(|entry| entry.membership().clone())
            .collect()
    }

    /// Snapshot of every group, in creation order
    pub fn grouping_info(&self) -> Vec<GroupInfo> {
        let mut entries: Vec<(&GroupKey, &GroupEntry)> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.ordinal());
        entries
            .into_iter()
            .map(|(key, entry)| GroupInfo {
                key: key.clone(),
                membership: entry.membership().clone(),
                items: entry.items,
                bytes: entry.bytes,
            })
            .collect()
    }

    /// Running counters
    pub fn stats(&self) -> &BufferStats {
        &self.stats
    }

    /// Buffer configuration
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }
}

impl Drop for WriteBuffer {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WriteBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBuffer")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("scratch_dir", &self.scratch_dir())
            .field("groups", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Close an open container through its codec, leaving the entry finalized.
///
/// If the codec fails the container's records cannot be recovered: the file
/// is removed, the entry starts a new cycle and the error is returned.
fn finalize_container(registry: &CodecRegistry, entry: &mut GroupEntry) -> Result<(), BufferError> {
    let (container, format) = match std::mem::take(&mut entry.state) {
        ContainerState::Open { container, format } => (container, format),
        other => {
            entry.state = other;
            return Ok(());
        }
    };

    let path = container.path().to_path_buf();
    let closed = match registry.get(format) {
        Some(codec) => codec.close(container).map_err(BufferError::from),
        None => Err(BufferError::UnsupportedFormat(format)),
    };
    match closed {
        Ok(()) => {
            entry.state = ContainerState::Finalized { path, format };
            Ok(())
        }
        Err(e) => {
            error!(
                "Failed to finalize container of group {}; {} items lost: {}",
                entry.membership(),
                entry.items,
                e
            );
            discard_file(&path);
            entry.reset();
            Err(e)
        }
    }
}

fn discard_file(path: &Path) {
    if let Err(e) = remove_if_exists(path) {
        warn!("Failed to remove temp file {}: {}", path.display(), e);
    }
}
