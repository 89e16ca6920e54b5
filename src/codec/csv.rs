use std::path::Path;

use ::csv::{QuoteStyle, WriterBuilder};

use crate::record::{Format, Record};

use super::{Codec, CodecError, Container, CsvOptions};

/// Tabular CSV with a fixed column list and optional header row
#[derive(Debug, Clone)]
pub struct CsvCodec {
    fields: Vec<String>,
    show_titles: bool,
    delimiter: u8,
}

impl CsvCodec {
    /// Build a codec from its options.
    ///
    /// Fails if no columns are configured or the delimiter is not a single
    /// ASCII character.
    pub fn new(options: &CsvOptions) -> Result<Self, CodecError> {
        if options.fields.is_empty() {
            return Err(CodecError::InvalidOptions(
                "CSV export requires a non-empty `fields` list".to_string(),
            ));
        }
        if !options.delimiter.is_ascii() {
            return Err(CodecError::InvalidOptions(format!(
                "CSV delimiter must be ASCII, got {:?}",
                options.delimiter
            )));
        }
        Ok(Self {
            fields: options.fields.clone(),
            show_titles: options.show_titles,
            delimiter: options.delimiter as u8,
        })
    }

    /// Configured columns
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn render_row<I, S>(&self, cells: I) -> Result<Vec<u8>, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());
        writer.write_record(cells)?;
        writer.into_inner().map_err(|e| CodecError::IoError(e.into_error()))
    }
}

impl Codec for CsvCodec {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn open(&self, path: &Path) -> Result<Container, CodecError> {
        let mut container = Container::create(path)?;
        if self.show_titles {
            let header = self.render_row(&self.fields)?;
            container.write_bytes(&header)?;
        }
        Ok(container)
    }

    fn append(&self, container: &mut Container, record: &Record) -> Result<u64, CodecError> {
        let row = self.render_row(self.fields.iter().map(|f| record.field_text(f)))?;
        Ok(container.write_bytes(&row)?)
    }

    fn close(&self, container: Container) -> Result<(), CodecError> {
        container.finish()?;
        Ok(())
    }
}
