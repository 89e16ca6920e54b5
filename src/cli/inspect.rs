use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Display the decompressed contents of a delivered artifact
pub fn run(file: PathBuf, preview: usize) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let (entry, content) = read_artifact(&file)?;
    let size_on_disk = std::fs::metadata(&file)
        .context("Failed to read file metadata")?
        .len();

    println!("exportbuf Artifact");
    println!("==================");
    println!("File: {}", file.display());
    println!("Entry: {}", entry);
    println!();

    let mut lines = 0usize;
    let mut bytes = 0u64;
    let mut head = Vec::new();
    for line in BufReader::new(content.as_slice()).lines() {
        let line = line.context("Artifact is not valid UTF-8 text")?;
        bytes += line.len() as u64 + 1;
        if head.len() < preview {
            head.push(line);
        }
        lines += 1;
    }

    println!("Statistics:");
    println!("  Lines: {}", lines);
    println!("  Uncompressed bytes: {}", bytes);
    println!("  Bytes on disk: {}", size_on_disk);
    if bytes > 0 {
        println!("  Ratio: {:.2}", size_on_disk as f64 / bytes as f64);
    }
    println!();

    if !head.is_empty() {
        println!("Preview:");
        for line in head {
            if line.chars().count() > 120 {
                let cut: String = line.chars().take(117).collect();
                println!("  {}...", cut);
            } else {
                println!("  {}", line);
            }
        }
    }

    Ok(())
}

/// Entry name and decompressed bytes of an artifact
fn read_artifact(path: &Path) -> Result<(String, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let handle = File::open(path).context("Failed to open file")?;
    let mut content = Vec::new();

    match path.extension().and_then(|e| e.to_str()) {
        Some("gz") => {
            GzDecoder::new(handle)
                .read_to_end(&mut content)
                .context("Failed to decompress gzip artifact")?;
            Ok((name.trim_end_matches(".gz").to_string(), content))
        }
        Some("zip") => {
            let mut archive = zip::ZipArchive::new(handle).context("Failed to read zip archive")?;
            if archive.is_empty() {
                anyhow::bail!("Zip archive is empty: {}", path.display());
            }
            let mut entry = archive.by_index(0).context("Failed to read zip entry")?;
            let entry_name = entry.name().to_string();
            entry
                .read_to_end(&mut content)
                .context("Failed to decompress zip entry")?;
            Ok((entry_name, content))
        }
        _ => {
            BufReader::new(handle)
                .read_to_end(&mut content)
                .context("Failed to read artifact")?;
            Ok((name, content))
        }
    }
}
