use std::fs::File;
use std::io::{Read, Write, stdin, stdout};
use std::path::Path;

use anyhow::Context;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

fn is_stdio(path: &Path) -> bool {
    path == Path::new("-")
}

/// Whether `path` names a compressed capture (`.gz` or `.tcz`).
pub fn has_gzip_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("tcz"))
        .unwrap_or(false)
}

fn gunzip(data: &[u8], what: &str) -> anyhow::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .with_context(|| format!("failed to decompress gzip data from {}", what))?;
    Ok(out)
}

/// Read capture bytes from a path or stdin (`-`).
///
/// Compressed input is detected by extension or by the gzip magic and is
/// decompressed transparently.
pub fn read_capture_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut data = Vec::new();
    if is_stdio(path) {
        stdin()
            .read_to_end(&mut data)
            .context("failed to read from stdin")?;
    } else {
        File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?
            .read_to_end(&mut data)
            .with_context(|| format!("failed to read input file: {}", path.display()))?;
    }

    let gzipped = data.starts_with(&GZIP_MAGIC) || (!is_stdio(path) && has_gzip_extension(path));
    if gzipped {
        let what = if is_stdio(path) {
            "stdin".to_string()
        } else {
            path.display().to_string()
        };
        gunzip(&data, &what)
    } else {
        Ok(data)
    }
}

/// Write capture bytes to a path or stdout (`-`), gzip-compressed when the
/// file name ends in `.gz` or `.tcz`.
pub fn write_capture_bytes(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if is_stdio(path) {
        let mut out = stdout().lock();
        out.write_all(bytes).context("failed to write to stdout")?;
        return out.flush().context("failed to flush stdout");
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;
    if has_gzip_extension(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(bytes)
            .context("failed to write compressed output")?;
        encoder.finish().context("failed to finish gzip stream")?;
    } else {
        file.write_all(bytes)
            .with_context(|| format!("failed to write output file: {}", path.display()))?;
    }
    Ok(())
}
