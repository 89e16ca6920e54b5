use std::path::Path;

use crate::record::{Format, Record};

use super::{Codec, CodecError, Container};

/// Line-delimited JSON: one object per line, no header or footer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesCodec;

impl Codec for JsonLinesCodec {
    fn format(&self) -> Format {
        Format::JsonLines
    }

    fn open(&self, path: &Path) -> Result<Container, CodecError> {
        Ok(Container::create(path)?)
    }

    fn append(&self, container: &mut Container, record: &Record) -> Result<u64, CodecError> {
        let mut line = serde_json::to_vec(&record.fields)?;
        line.push(b'\n');
        Ok(container.write_bytes(&line)?)
    }

    fn close(&self, container: Container) -> Result<(), CodecError> {
        container.finish()?;
        Ok(())
    }
}
