use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::config::Compression;
use super::error::BufferError;

/// Compress `source` into a new artifact at `dest`, returning its size in bytes.
///
/// `source` is left untouched so the same container can be packed again.
pub(super) fn pack_file(
    source: &Path,
    dest: &Path,
    compression: Compression,
) -> Result<u64, BufferError> {
    match compression {
        Compression::Gz => {
            let mut input = File::open(source)?;
            let output = BufWriter::new(File::create(dest)?);
            let mut encoder = GzEncoder::new(output, flate2::Compression::default());
            io::copy(&mut input, &mut encoder)?;
            let mut output = encoder.finish()?;
            output.flush()?;
        }
        Compression::Zip => {
            let entry_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "data".to_string());
            let mut input = File::open(source)?;
            let mut zip_writer = ZipWriter::new(BufWriter::new(File::create(dest)?));
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644);
            zip_writer.start_file(entry_name, options)?;
            io::copy(&mut input, &mut zip_writer)?;
            let mut output = zip_writer.finish()?;
            output.flush()?;
        }
        Compression::None => {
            fs::copy(source, dest)?;
        }
    }
    Ok(fs::metadata(dest)?.len())
}

/// Remove a file, treating "already gone" as success
pub(super) fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
