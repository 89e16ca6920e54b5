//! # Format Codecs
//!
//! A codec knows how to open a temp container for one [`Format`], append a
//! single record to it, and finalize it. The buffer never looks at rendered
//! bytes; it only accumulates the byte counts codecs report.
//!
//! Codecs are looked up through a [`CodecRegistry`] built once when the
//! buffer is constructed:
//!
//! ```rust,no_run
//! use exportbuf::codec::{CodecRegistry, FormatOptions};
//! use exportbuf::record::Format;
//!
//! let registry = CodecRegistry::with_defaults(&FormatOptions::default())?;
//! assert!(registry.get(Format::JsonLines).is_some());
//! # Ok::<(), exportbuf::codec::CodecError>(())
//! ```

mod container;
mod csv;
mod error;
mod jsonl;
mod options;
mod registry;
mod xml;


use std::path::Path;

use crate::record::{Format, Record};

pub use self::csv::CsvCodec;
pub use container::Container;
pub use error::CodecError;
pub use jsonl::JsonLinesCodec;
pub use options::{CsvOptions, FormatOptions, XmlOptions};
pub use registry::CodecRegistry;
pub use xml::{XmlCodec, FIELD_ELEMENT, FIELD_NAME_ATTRIBUTE};

/// Open/append/close contract for one serialization format
pub trait Codec: Send + Sync {
    /// Format this codec renders
    fn format(&self) -> Format;

    /// Create a container at `path`, writing any format header
    fn open(&self, path: &Path) -> Result<Container, CodecError>;

    /// Append one record, returning the number of bytes it occupies
    fn append(&self, container: &mut Container, record: &Record) -> Result<u64, CodecError>;

    /// Write any format footer and release the container
    fn close(&self, container: Container) -> Result<(), CodecError>;
}
