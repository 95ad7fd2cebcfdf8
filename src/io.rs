// File-level helpers for compression and decompression.
//
// Provides `compress_file()`, `decompress_file()` and `roundtrip_file()`.
// Compression is whole-buffer, so each helper reads its input fully into
// memory. `roundtrip_file()` is the verification harness: it times both
// directions and checks the output against the input. With the `file-io`
// feature, SHA-256 digests of input and output are included in the stats.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::compress::decoder::{DecompressError, Decoder};
use crate::compress::encoder::{CompressError, CompressOptions, Encoder};
use crate::lz77::{Format, TokenStats};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone)]
pub struct CompressStats {
    /// Input file size in bytes.
    pub input_size: u64,
    /// Compressed output size in bytes.
    pub output_size: u64,
    /// Token counts.
    pub tokens: TokenStats,
    /// SHA-256 of the input file (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone)]
pub struct DecompressStats {
    /// Compressed input size in bytes.
    pub input_size: u64,
    /// Reconstructed output size in bytes.
    pub output_size: u64,
    /// Token counts.
    pub tokens: TokenStats,
    /// SHA-256 of the reconstructed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `roundtrip_file()`.
#[derive(Debug, Clone)]
pub struct RoundTripStats {
    pub format: Format,
    pub window_size: usize,
    /// Input file size in bytes.
    pub input_size: u64,
    /// Compressed size in bytes.
    pub compressed_size: u64,
    pub compress_time: Duration,
    pub decompress_time: Duration,
    /// Token counts of the compressed stream.
    pub tokens: TokenStats,
    /// SHA-256 of the input (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
    /// SHA-256 of the decompressed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

impl RoundTripStats {
    /// Compressed size as a fraction of the input size (1.0 for empty input).
    pub fn ratio(&self) -> f64 {
        if self.input_size == 0 {
            return 1.0;
        }
        self.compressed_size as f64 / self.input_size as f64
    }

    /// Input MiB compressed per second.
    pub fn compress_mib_per_sec(&self) -> f64 {
        throughput(self.input_size, self.compress_time)
    }

    /// Compressed MiB decoded per second.
    pub fn decompress_mib_per_sec(&self) -> f64 {
        throughput(self.compressed_size, self.decompress_time)
    }
}

fn throughput(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return f64::INFINITY;
    }
    bytes as f64 / (1024.0 * 1024.0) / secs
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Compression error.
    #[error("compress error: {0}")]
    Compress(#[from] CompressError),
    /// Decompression error.
    #[error("decompress error: {0}")]
    Decompress(#[from] DecompressError),
    /// Decompressed output differs from the original input.
    #[error(
        "round trip mismatch: input {input_len} bytes, output {output_len} bytes, \
         first difference at {first_difference}"
    )]
    RoundTripMismatch {
        input_len: usize,
        output_len: usize,
        first_difference: usize,
    },
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// compress_file / decompress_file
// ---------------------------------------------------------------------------

/// Compress `input_path` into `output_path`.
pub fn compress_file(
    input_path: &Path,
    output_path: &Path,
    opts: &CompressOptions,
) -> Result<CompressStats, IoError> {
    let mut encoder = Encoder::new(opts.clone())?;
    let input = std::fs::read(input_path)?;
    let output = encoder.compress(&input)?;
    write_file(output_path, &output)?;

    Ok(CompressStats {
        input_size: input.len() as u64,
        output_size: output.len() as u64,
        tokens: encoder.stats(),
        input_sha256: sha256(&input),
    })
}

/// Decompress `input_path` (encoded with `format`) into `output_path`.
pub fn decompress_file(
    input_path: &Path,
    output_path: &Path,
    format: Format,
) -> Result<DecompressStats, IoError> {
    let input = std::fs::read(input_path)?;
    let mut decoder = Decoder::new(format);
    let output = decoder.decompress(&input)?;
    write_file(output_path, &output)?;

    Ok(DecompressStats {
        input_size: input.len() as u64,
        output_size: output.len() as u64,
        tokens: decoder.stats(),
        output_sha256: sha256(&output),
    })
}

// ---------------------------------------------------------------------------
// roundtrip
// ---------------------------------------------------------------------------

/// Compress then decompress the contents of `input_path`, timing both and
/// verifying the output equals the input.
pub fn roundtrip_file(input_path: &Path, opts: &CompressOptions) -> Result<RoundTripStats, IoError> {
    let input = std::fs::read(input_path)?;
    roundtrip(&input, opts)
}

/// In-memory form of `roundtrip_file()`.
pub fn roundtrip(input: &[u8], opts: &CompressOptions) -> Result<RoundTripStats, IoError> {
    let mut encoder = Encoder::new(opts.clone())?;
    let mut decoder = Decoder::new(opts.format);

    let start = Instant::now();
    let compressed = encoder.compress(input)?;
    let compress_time = start.elapsed();

    let start = Instant::now();
    let output = decoder.decompress(&compressed)?;
    let decompress_time = start.elapsed();

    if output != input {
        let first_difference = input
            .iter()
            .zip(&output)
            .position(|(a, b)| a != b)
            .unwrap_or(input.len().min(output.len()));
        return Err(IoError::RoundTripMismatch {
            input_len: input.len(),
            output_len: output.len(),
            first_difference,
        });
    }

    Ok(RoundTripStats {
        format: opts.format,
        window_size: opts.window_size,
        input_size: input.len() as u64,
        compressed_size: compressed.len() as u64,
        compress_time,
        decompress_time,
        tokens: encoder.stats(),
        input_sha256: sha256(input),
        output_sha256: sha256(&output),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(path)?);
    writer.write_all(data)?;
    writer.flush()
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

/// Lowercase hex rendering of a digest.
pub fn hex_digest(digest: &[u8; 32]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_file(name: &str, data: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("oxilz_io_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    fn cleanup_temp_files(paths: &[&Path]) {
        for p in paths {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn compress_decompress_file_roundtrip() {
        let data = b"The quick brown fox jumps over the lazy dog. The quick brown fox!";
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let input_path = write_temp_file(&format!("{format}_input.bin"), data);
            let packed_path = write_temp_file(&format!("{format}_packed.lz"), b"");
            let output_path = write_temp_file(&format!("{format}_output.bin"), b"");

            let c = compress_file(&input_path, &packed_path, &CompressOptions::for_format(format))
                .unwrap();
            assert_eq!(c.input_size, data.len() as u64);
            assert!(c.output_size < c.input_size);
            assert!(c.tokens.matches >= 1);

            let d = decompress_file(&packed_path, &output_path, format).unwrap();
            assert_eq!(d.output_size, data.len() as u64);
            assert_eq!(d.input_size, c.output_size);
            assert_eq!(std::fs::read(&output_path).unwrap(), data);

            cleanup_temp_files(&[&input_path, &packed_path, &output_path]);
        }
    }

    #[test]
    fn roundtrip_reports_sizes() {
        let data: Vec<u8> = b"abcdefgh".iter().copied().cycle().take(4096).collect();
        let stats = roundtrip(&data, &CompressOptions::default()).unwrap();
        assert_eq!(stats.input_size, 4096);
        assert!(stats.compressed_size < 100);
        assert!(stats.ratio() < 0.05);
        assert_eq!(stats.format, Format::EscapedFixedWidth);
    }

    #[test]
    fn roundtrip_empty() {
        let stats = roundtrip(b"", &CompressOptions::default()).unwrap();
        assert_eq!(stats.compressed_size, 0);
        assert_eq!(stats.ratio(), 1.0);
    }

    #[test]
    fn roundtrip_rejects_bad_window() {
        let opts = CompressOptions {
            window_size: 1 << 20,
            ..Default::default()
        };
        assert!(matches!(
            roundtrip(b"data", &opts),
            Err(IoError::Compress(CompressError::InvalidWindowSize { .. }))
        ));
    }

    #[test]
    fn corrupt_file_fails_to_decompress() {
        let input_path = write_temp_file("corrupt.lz", &[b'x', 0xFF, 0x00]);
        let output_path = write_temp_file("corrupt_out.bin", b"");
        let err = decompress_file(&input_path, &output_path, Format::EscapedFixedWidth).unwrap_err();
        assert!(matches!(err, IoError::Decompress(DecompressError::Malformed(_))));
        cleanup_temp_files(&[&input_path, &output_path]);
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_digests_match() {
        let data = b"digest me, digest me, digest me";
        let stats = roundtrip(data, &CompressOptions::default()).unwrap();
        assert!(stats.input_sha256.is_some());
        assert_eq!(stats.input_sha256, stats.output_sha256);
        let hex = hex_digest(&stats.input_sha256.unwrap());
        assert_eq!(hex.len(), 64);
    }
}
