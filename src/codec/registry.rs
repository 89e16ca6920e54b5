use std::collections::HashMap;

use crate::record::Format;

use super::{Codec, CodecError, CsvCodec, FormatOptions, JsonLinesCodec, XmlCodec};

/// Closed table mapping each format to its codec
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<Format, Box<dyn Codec>>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in codec.
    ///
    /// CSV is only registered when columns are configured, so records tagged
    /// as CSV are rejected as unsupported instead of rendering empty rows.
    pub fn with_defaults(options: &FormatOptions) -> Result<Self, CodecError> {
        let mut registry = Self::new();
        registry.register(Box::new(JsonLinesCodec));
        registry.register(Box::new(XmlCodec::new(&options.xml)?));
        if !options.csv.fields.is_empty() {
            registry.register(Box::new(CsvCodec::new(&options.csv)?));
        }
        Ok(registry)
    }

    /// Add or replace the codec for its format
    pub fn register(&mut self, codec: Box<dyn Codec>) {
        self.codecs.insert(codec.format(), codec);
    }

    /// Codec for `format`, if registered
    pub fn get(&self, format: Format) -> Option<&dyn Codec> {
        self.codecs.get(&format).map(|c| c.as_ref())
    }

    /// Registered formats
    pub fn formats(&self) -> impl Iterator<Item = Format> + '_ {
        self.codecs.keys().copied()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.codecs.keys()).finish()
    }
}
