use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use exportbuf::buffer::Compression;
use exportbuf::record::Format;

mod config;
mod export;
mod inspect;

pub use config::Config;

/// exportbuf - grouped, threshold-triggered batch export
#[derive(Parser)]
#[command(name = "exportbuf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format of exported records.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// One JSON object per line
    #[value(alias = "json")]
    Jl,
    /// Comma-separated values (needs --csv-fields)
    Csv,
    /// One element per record under a root element
    Xml,
}

/// Compression applied to delivered artifacts.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompressionArg {
    /// Gzip stream
    Gz,
    /// Single-entry zip archive
    Zip,
    /// No compression
    None,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jl => Format::JsonLines,
            FormatArg::Csv => Format::Csv,
            FormatArg::Xml => Format::Xml,
        }
    }
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Gz => Compression::Gz,
            CompressionArg::Zip => Compression::Zip,
            CompressionArg::None => Compression::None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export JSON lines into grouped, compressed artifacts
    Export(ExportArgs),

    /// Show the contents of a delivered artifact
    Inspect {
        /// Artifact path (.gz, .zip or uncompressed)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Number of lines to preview
        #[arg(short = 'n', long, default_value_t = 5)]
        lines: usize,
    },
}

/// Options of the export command. Flags override values from `--config`.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Input file with one JSON object per line (stdin when omitted)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Directory artifacts are delivered into
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Record fields to group by (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub group_by: Vec<String>,

    /// Columns to emit in CSV output (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub csv_fields: Vec<String>,

    /// Items per group before delivery (0 disables)
    #[arg(long)]
    pub items_per_write: Option<u64>,

    /// Bytes per group before delivery (0 disables)
    #[arg(long)]
    pub size_per_write: Option<u64>,

    /// Stop after this many items (0 = unlimited)
    #[arg(long)]
    pub items_limit: Option<u64>,

    /// Verify the delivered artifacts on close
    #[arg(long)]
    pub check_consistency: bool,

    /// Artifact compression
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Parent directory for temp containers
    #[arg(long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Records per batch handed to the writer
    #[arg(short, long, default_value_t = 1000)]
    pub batch_size: usize,
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export(args) => export::run(args),
        Commands::Inspect { file, lines } => inspect::run(file, lines),
    }
}
