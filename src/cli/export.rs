use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};

use exportbuf::codec::CodecRegistry;
use exportbuf::grouper::grouper_for_fields;
use exportbuf::record::{Format, Record};
use exportbuf::sinks::DirectorySink;
use exportbuf::writer::BatchWriter;

use super::{Config, ExportArgs};

/// Read JSON lines and export them through a batch writer
pub fn run(args: ExportArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.apply_overrides(&args);

    let format = config.output_format();
    let registry =
        CodecRegistry::with_defaults(&config.format.options()).context("Invalid format options")?;
    if registry.get(format).is_none() {
        anyhow::bail!(
            "Format {} is not configured (CSV output needs --csv-fields or [format.csv] fields)",
            format
        );
    }
    if args.batch_size == 0 {
        anyhow::bail!("Batch size must be at least 1");
    }

    let sink = DirectorySink::new(&args.output).with_context(|| {
        format!("Failed to create output directory: {}", args.output.display())
    })?;
    let grouper = grouper_for_fields(&config.grouper.fields);
    let mut writer = BatchWriter::new(config.writer, registry, grouper, sink)
        .context("Failed to create batch writer")?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("Failed to open input file: {}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    info!("Exporting {} records into {}", format, args.output.display());

    let mut batch = Vec::with_capacity(args.batch_size);
    let mut skipped = 0u64;
    let mut quota_reached = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(format, &line) {
            Ok(record) => batch.push(record),
            Err(reason) => {
                warn!("Skipping line {}: {}", index + 1, reason);
                skipped += 1;
                continue;
            }
        }

        if batch.len() >= args.batch_size {
            quota_reached = writer.write_batch(&batch)?.is_quota_reached();
            batch.clear();
            if quota_reached {
                break;
            }
        }
    }
    if !quota_reached && !batch.is_empty() {
        writer.write_batch(&batch)?;
    }

    writer.flush().context("Failed to flush remaining groups")?;
    writer.close()?;

    let state = writer.state();
    println!("Export Summary");
    println!("==============");
    println!("Output: {}", writer.sink().root().display());
    println!("Format: {}", format);
    println!("Items processed: {}", state.items_count);
    println!("Items delivered: {}", state.items_delivered);
    println!("Artifacts: {}", state.artifacts_delivered);
    println!("Groups: {}", writer.buffer_stats().groups);
    if skipped > 0 {
        println!("Skipped lines: {}", skipped);
    }
    if quota_reached {
        println!("Stopped at items limit ({})", writer.config().items_limit);
    }

    Ok(())
}

fn parse_line(format: Format, line: &str) -> Result<Record, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| e.to_string())?;
    Record::from_value(format, value).ok_or_else(|| "not a JSON object".to_string())
}
