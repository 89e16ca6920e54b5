use serde::Deserialize;

/// Per-format rendering options
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatOptions {
    /// CSV rendering options
    #[serde(default)]
    pub csv: CsvOptions,

    /// XML rendering options
    #[serde(default)]
    pub xml: XmlOptions,
}

/// CSV rendering options
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CsvOptions {
    /// Columns to emit, in order. Required when CSV records are exported.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Emit a header row with the column names
    #[serde(default = "default_show_titles")]
    pub show_titles: bool,

    /// Field delimiter
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_show_titles() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            show_titles: default_show_titles(),
            delimiter: default_delimiter(),
        }
    }
}

/// XML rendering options
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XmlOptions {
    /// Name of the document root element
    #[serde(default = "default_root_element")]
    pub root_element: String,

    /// Name of the element wrapping each record
    #[serde(default = "default_item_element")]
    pub item_element: String,
}

fn default_root_element() -> String {
    "root".to_string()
}

fn default_item_element() -> String {
    "item".to_string()
}

impl Default for XmlOptions {
    fn default() -> Self {
        Self {
            root_element: default_root_element(),
            item_element: default_item_element(),
        }
    }
}
