use std::io::Cursor;

/// Minimum pixel payload size (in bytes) before compression is attempted.
///
/// Smaller payloads are always stored raw; the zstd frame header alone
/// eats most of what could be saved.
pub const COMPRESSION_THRESHOLD: usize = 256;

/// zstd level used for image payloads.
const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compress a pixel payload with zstd.
///
/// Returns `Some(compressed)` only if that is strictly smaller than the
/// input. `None` means store the payload raw.
///
/// ```rust
/// use drf_encoder::compression::compress;
///
/// let flat = vec![0x80u8; 64 * 64];
/// assert!(compress(&flat).unwrap().len() < flat.len());
/// ```
#[must_use]
pub fn compress(data: &[u8]) -> Option<Vec<u8>> {
    let compressed = zstd::encode_all(Cursor::new(data), DEFAULT_COMPRESSION_LEVEL).ok()?;
    (compressed.len() < data.len()).then_some(compressed)
}
