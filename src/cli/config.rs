//! TOML job file support.
//!
//! Instead of passing many CLI flags, an export job can be described in a
//! config file:
//!
//! ```toml
//! # job.toml
//! [writer]
//! items_per_buffer_write = 100000
//! size_per_buffer_write = 0
//! items_limit = 0
//! check_consistency = true
//! compression = "gz"
//!
//! [grouper]
//! fields = ["country"]
//!
//! [format]
//! output = "csv"
//!
//! [format.csv]
//! fields = ["id", "country", "name"]
//! show_titles = true
//! ```
//!
//! Unknown keys are rejected so a mistyped option fails before any record is
//! read.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use exportbuf::codec::{CsvOptions, FormatOptions, XmlOptions};
use exportbuf::record::Format;
use exportbuf::writer::WriterConfig;

use super::ExportArgs;

/// Root configuration structure for job files.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Writer thresholds, limits and packaging.
    #[serde(default)]
    pub writer: WriterConfig,

    /// How records are grouped.
    #[serde(default)]
    pub grouper: GrouperConfig,

    /// Output format and per-format options.
    #[serde(default)]
    pub format: FormatConfig,
}

/// Grouping settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GrouperConfig {
    /// Fields whose values form the group key; empty disables grouping.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Output format settings.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    /// Format records are exported in (JSON lines when unset).
    pub output: Option<Format>,

    /// CSV rendering options.
    #[serde(default)]
    pub csv: CsvOptions,

    /// XML rendering options.
    #[serde(default)]
    pub xml: XmlOptions,
}

impl FormatConfig {
    /// Codec options for the registry.
    pub fn options(&self) -> FormatOptions {
        FormatOptions {
            csv: self.csv.clone(),
            xml: self.xml.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_overrides(&mut self, args: &ExportArgs) {
        if let Some(items) = args.items_per_write {
            self.writer.items_per_buffer_write = items;
        }
        if let Some(size) = args.size_per_write {
            self.writer.size_per_buffer_write = size;
        }
        if let Some(limit) = args.items_limit {
            self.writer.items_limit = limit;
        }
        if args.check_consistency {
            self.writer.check_consistency = true;
        }
        if let Some(compression) = args.compression {
            self.writer.compression = compression.into();
        }
        if let Some(dir) = &args.tmp_dir {
            self.writer.tmp_dir = Some(dir.clone());
        }
        if let Some(format) = args.format {
            self.format.output = Some(format.into());
        }
        if !args.group_by.is_empty() {
            self.grouper.fields = args.group_by.clone();
        }
        if !args.csv_fields.is_empty() {
            self.format.csv.fields = args.csv_fields.clone();
        }
    }

    /// Format records are exported in.
    pub fn output_format(&self) -> Format {
        self.format.output.unwrap_or(Format::JsonLines)
    }
}
