use std::path::PathBuf;

use serde::Deserialize;

/// Default number of items per group before it is flushed
pub const ITEMS_PER_BUFFER_WRITE: u64 = 500_000;

/// Default accumulated bytes per group before it is flushed
pub const SIZE_PER_BUFFER_WRITE: u64 = 4_000_000_000;

/// Flush thresholds. A zero value disables that dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Item count that triggers a flush
    pub items_per_buffer_write: u64,
    /// Byte size that triggers a flush
    pub size_per_buffer_write: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            items_per_buffer_write: ITEMS_PER_BUFFER_WRITE,
            size_per_buffer_write: SIZE_PER_BUFFER_WRITE,
        }
    }
}

impl Thresholds {
    /// Thresholds that never trigger
    pub fn disabled() -> Self {
        Self {
            items_per_buffer_write: 0,
            size_per_buffer_write: 0,
        }
    }

    /// Flush after `items` records
    pub fn items(items: u64) -> Self {
        Self {
            items_per_buffer_write: items,
            size_per_buffer_write: 0,
        }
    }

    /// Flush after `bytes` accumulated bytes
    pub fn size(bytes: u64) -> Self {
        Self {
            items_per_buffer_write: 0,
            size_per_buffer_write: bytes,
        }
    }

    /// True when either enabled dimension has been reached
    pub fn is_reached(&self, items: u64, bytes: u64) -> bool {
        (self.items_per_buffer_write != 0 && items >= self.items_per_buffer_write)
            || (self.size_per_buffer_write != 0 && bytes >= self.size_per_buffer_write)
    }
}

/// How packed artifacts are compressed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Gzip stream (`.gz`)
    #[default]
    #[serde(alias = "gzip")]
    Gz,
    /// Single-entry zip archive (`.zip`)
    Zip,
    /// Plain copy of the container
    None,
}

impl Compression {
    /// Extension appended to packed artifacts, if any
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Gz => Some("gz"),
            Self::Zip => Some("zip"),
            Self::None => None,
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gz" | "gzip" => Ok(Self::Gz),
            "zip" => Ok(Self::Zip),
            "none" => Ok(Self::None),
            other => Err(format!("unsupported compression: {}", other)),
        }
    }
}

/// Configuration for the write buffer
#[derive(Debug, Clone, Default)]
pub struct BufferConfig {
    /// Flush thresholds
    pub thresholds: Thresholds,

    /// Artifact compression
    pub compression: Compression,

    /// Parent directory for the per-buffer scratch directory
    /// (system temp dir when unset)
    pub tmp_dir: Option<PathBuf>,
}
