use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::record::{Format, Record};

use super::{Codec, CodecError, Container, XmlOptions};

/// Element used for fields whose names are not valid element names
pub const FIELD_ELEMENT: &str = "field";

/// Attribute carrying the original name of a [`FIELD_ELEMENT`]
pub const FIELD_NAME_ATTRIBUTE: &str = "name";

/// XML document with one element per record under a single root.
///
/// Each field becomes a child element named after it. A field name that is
/// not a valid element name is written as
/// `<field name="original name">value</field>` instead.
#[derive(Debug, Clone)]
pub struct XmlCodec {
    root_element: String,
    item_element: String,
}

impl XmlCodec {
    /// Build a codec from its options
    pub fn new(options: &XmlOptions) -> Result<Self, CodecError> {
        for name in [&options.root_element, &options.item_element] {
            if !is_element_name(name) {
                return Err(CodecError::InvalidOptions(format!(
                    "invalid XML element name: {:?}",
                    name
                )));
            }
        }
        Ok(Self {
            root_element: options.root_element.clone(),
            item_element: options.item_element.clone(),
        })
    }

    fn render_item(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let mut writer = Writer::new(Vec::with_capacity(64));
        writer.write_event(Event::Start(BytesStart::new(self.item_element.as_str())))?;

        for name in record.fields.keys() {
            let text = record.field_text(name);
            let (tag, start) = if is_element_name(name) {
                (name.as_str(), BytesStart::new(name.as_str()))
            } else {
                let mut start = BytesStart::new(FIELD_ELEMENT);
                start.push_attribute((FIELD_NAME_ATTRIBUTE, name.as_str()));
                (FIELD_ELEMENT, start)
            };
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(self.item_element.as_str())))?;
        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

impl Codec for XmlCodec {
    fn format(&self) -> Format {
        Format::Xml
    }

    fn open(&self, path: &Path) -> Result<Container, CodecError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.get_mut().push(b'\n');
        writer.write_event(Event::Start(BytesStart::new(self.root_element.as_str())))?;
        writer.get_mut().push(b'\n');

        let mut container = Container::create(path)?;
        container.write_bytes(&writer.into_inner())?;
        Ok(container)
    }

    fn append(&self, container: &mut Container, record: &Record) -> Result<u64, CodecError> {
        let item = self.render_item(record)?;
        Ok(container.write_bytes(&item)?)
    }

    fn close(&self, mut container: Container) -> Result<(), CodecError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::End(BytesEnd::new(self.root_element.as_str())))?;
        writer.get_mut().push(b'\n');
        container.write_bytes(&writer.into_inner())?;
        container.finish()?;
        Ok(())
    }
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !name.to_ascii_lowercase().starts_with("xml")
}
