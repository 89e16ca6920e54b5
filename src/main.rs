//! # exportbuf
//!
//! Command-line front end for the grouped batch writer.
//!
//! ## Usage
//!
//! ```bash
//! # Group JSON lines by country and deliver gzip artifacts into ./out
//! exportbuf export items.jl --output out --group-by country
//!
//! # Read from stdin, emit CSV, stop after 1000 items
//! cat items.jl | exportbuf export --output out --format csv \
//!     --config job.toml --items-limit 1000
//!
//! # Look inside a delivered artifact
//! exportbuf inspect out/es/group-00000-0000-<uuid>.jl.gz
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    cli::init_logging(cli.verbose);

    cli::dispatch(cli)
}
