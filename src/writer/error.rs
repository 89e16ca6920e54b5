use crate::buffer::BufferError;
use crate::codec::CodecError;

/// Errors a sink reports when it cannot store an artifact
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O error while storing the artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Any other backend failure
    #[error("{0}")]
    Other(String),
}

/// Mismatch found by an end-of-job consistency check
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{details}")]
pub struct Inconsistency {
    /// Human-readable description of the mismatch
    pub details: String,
}

impl Inconsistency {
    /// Create an inconsistency report
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }
}

/// Errors that can occur while writing batches
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// Invalid writer configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error from the codec registry
    #[error("Codec error: {0}")]
    CodecError(#[from] CodecError),

    /// Error from the write buffer
    #[error("Buffer error: {0}")]
    BufferError(#[from] BufferError),

    /// The sink failed to store an artifact
    #[error("Delivery error: {0}")]
    DeliveryError(#[from] SinkError),

    /// The consistency check found a mismatch
    #[error("Inconsistent write state: {0}")]
    Inconsistent(#[from] Inconsistency),

    /// Writer used after close
    #[error("Writer is closed")]
    Closed,
}
