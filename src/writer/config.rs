use std::path::PathBuf;

use serde::Deserialize;

use crate::buffer::{
    BufferConfig, Compression, Thresholds, ITEMS_PER_BUFFER_WRITE, SIZE_PER_BUFFER_WRITE,
};

use super::error::WriterError;

/// Configuration for a batch writer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    /// Items per group before it is delivered (0 disables)
    pub items_per_buffer_write: u64,

    /// Accumulated bytes per group before it is delivered (0 disables)
    pub size_per_buffer_write: u64,

    /// Total items to process before reporting quota reached (0 = unlimited)
    pub items_limit: u64,

    /// Run the sink's consistency check on close
    pub check_consistency: bool,

    /// Artifact compression
    pub compression: Compression,

    /// Parent directory for temp containers (system temp dir when unset)
    pub tmp_dir: Option<PathBuf>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            items_per_buffer_write: ITEMS_PER_BUFFER_WRITE,
            size_per_buffer_write: SIZE_PER_BUFFER_WRITE,
            items_limit: 0,
            check_consistency: false,
            compression: Compression::default(),
            tmp_dir: None,
        }
    }
}

impl WriterConfig {
    /// Check options that cannot be expressed in the types alone
    pub fn validate(&self) -> Result<(), WriterError> {
        if let Some(dir) = &self.tmp_dir {
            if !dir.is_dir() {
                return Err(WriterError::ConfigError(format!(
                    "tmp_dir is not an existing directory: {}",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Flush thresholds
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            items_per_buffer_write: self.items_per_buffer_write,
            size_per_buffer_write: self.size_per_buffer_write,
        }
    }

    /// Configuration for the underlying write buffer
    pub fn buffer_config(&self) -> BufferConfig {
        BufferConfig {
            thresholds: self.thresholds(),
            compression: self.compression,
            tmp_dir: self.tmp_dir.clone(),
        }
    }
}
