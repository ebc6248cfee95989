use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read a whole file, inflating it if it starts with the gzip magic bytes.
pub fn read_maybe_gzip(path: &Path) -> Result<Vec<u8>> {
    let raw = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if !raw.starts_with(&GZIP_MAGIC) {
        return Ok(raw);
    }
    let mut decoder = GzDecoder::new(raw.as_slice());
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .with_context(|| format!("Failed to decompress {}", path.display()))?;
    Ok(out)
}

/// Whether files at this path should be written compressed.
pub fn wants_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Write `bytes` to `path`, gzip-compressing when the name ends in `.gz`.
/// Parent directories are created as needed.
///
/// Bytes go to a temporary file in the same directory which is then renamed
/// over `path`, so a failed write never leaves a truncated file behind.
pub fn write_maybe_gzip(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
            parent
        }
        None => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        if wants_gzip(path) {
            let mut encoder = GzEncoder::new(&mut writer, Compression::default());
            encoder.write_all(bytes)?;
            encoder.finish()?;
        } else {
            writer.write_all(bytes)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    temp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
