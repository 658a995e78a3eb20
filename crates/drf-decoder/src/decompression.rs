use std::io::Read;

use crate::error::DecodeError;

/// Inflate a zstd payload, refusing to produce more than `limit` bytes.
///
/// The output is read through a `take(limit + 1)` so a bomb is caught
/// after at most one byte past the cap, not after inflating all of it.
pub(crate) fn decompress(data: &[u8], limit: usize) -> Result<Vec<u8>, DecodeError> {
    let decoder = zstd::stream::read::Decoder::new(data)
        .map_err(|e| DecodeError::DecompressFailed(e.to_string()))?;

    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut out = Vec::new();
    decoder
        .take(cap)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::DecompressFailed(e.to_string()))?;

    if out.len() > limit {
        return Err(DecodeError::DecompressionBomb { limit });
    }
    Ok(out)
}
