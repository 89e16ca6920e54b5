use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Open temp file a group accumulates into.
///
/// The container owns its file handle; dropping it releases the descriptor.
/// Removing the file from disk is the buffer's job.
pub struct Container {
    path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl Container {
    /// Create (or truncate) the file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            bytes_written: 0,
        })
    }

    /// Append raw bytes, returning how many were written
    pub fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<u64> {
        self.writer.write_all(bytes)?;
        let len = bytes.len() as u64;
        self.bytes_written += len;
        Ok(len)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total bytes written so far, including any header
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush buffered bytes to disk and release the handle
    pub fn finish(self) -> std::io::Result<PathBuf> {
        let Self { path, writer, .. } = self;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(path)
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("path", &self.path)
            .field("bytes_written", &self.bytes_written)
            .finish()
    }
}
