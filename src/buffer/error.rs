use crate::codec::CodecError;
use crate::record::{Format, GroupKey};

/// Errors that can occur while buffering or packing groups
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// I/O error on a temp container or artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from a format codec
    #[error("Codec error: {0}")]
    CodecError(#[from] CodecError),

    /// Error building a zip artifact
    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// No codec is registered for the record's format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(Format),

    /// A group received a record in a different format than its container
    #[error("Group {key} is buffering {expected} records, got {actual}")]
    FormatMismatch {
        /// Group receiving the record
        key: GroupKey,
        /// Format of the open container
        expected: Format,
        /// Format of the offending record
        actual: Format,
    },

    /// Operation on a key that has never been buffered
    #[error("Unknown group: {0}")]
    UnknownGroup(GroupKey),

    /// Packing requested for a group holding no records
    #[error("Group {0} has no buffered records")]
    EmptyGroup(GroupKey),

    /// Record buffered into a group that was packed but not yet finished
    #[error("Group {0} is packed and awaiting delivery")]
    GroupPacked(GroupKey),

    /// Finish requested for a group that was never packed
    #[error("Group {0} has not been packed")]
    NotPacked(GroupKey),

    /// Buffer used after close
    #[error("Write buffer is closed")]
    Closed,
}
