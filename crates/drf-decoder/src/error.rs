use drf_lazy::LazyError;
use drf_types::error::TypeError;
use drf_wire::WireError;

/// Errors raised while reading a document or loading one of its images.
///
/// ```text
///   DecodeError
///   ├── InvalidHeader(WireError)   ← magic, version, or reserved byte wrong
///   ├── MissingEndSentinel         ← stream ran out without END region
///   ├── TrailingData               ← extra bytes after END sentinel
///   ├── RegionTooLarge             ← body exceeds the configured cap
///   ├── NotAnImage                 ← image target bound to another region
///   ├── DecompressFailed           ← zstd decompression error
///   ├── DecompressionBomb          ← decompressed size exceeds the cap
///   ├── PixelSizeMismatch          ← pixels ≠ width × height × bpp
///   ├── DigestMismatch             ← BLAKE3 of pixels ≠ stored digest
///   ├── RowOutOfRange              ← row index past the image height
///   ├── Lazy(LazyError)            ← binding / deferred-load failures
///   ├── Type(TypeError)            ← from drf-types body deserialization
///   ├── Wire(WireError)            ← from drf-wire frame parsing
///   └── Io(std::io::Error)         ← from the underlying stream
/// ```
///
/// Errors from a deferred image load arrive wrapped:
/// `Lazy(LazyError::DeferredLoad { source, .. })` where `source` is
/// itself a `DecodeError`. [`deferred_cause`](Self::deferred_cause)
/// unwraps that.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid header: {0}")]
    InvalidHeader(WireError),

    #[error("document does not end with END sentinel")]
    MissingEndSentinel,

    #[error("unexpected data after END sentinel ({extra_bytes} bytes)")]
    TrailingData { extra_bytes: u64 },

    #[error("region at offset {offset} too large: {size} bytes, limit {limit}")]
    RegionTooLarge { offset: u64, size: u64, limit: usize },

    #[error("region at offset {offset} has type {found:#04X}, expected IMAGE")]
    NotAnImage { offset: u64, found: u8 },

    #[error("zstd decompression failed: {0}")]
    DecompressFailed(String),

    #[error("decompressed size exceeds limit {limit}")]
    DecompressionBomb { limit: usize },

    #[error("image needs {} pixel bytes, payload has {actual}", expected_label(.expected))]
    PixelSizeMismatch { expected: Option<u64>, actual: usize },

    #[error("pixel digest mismatch in image at offset {offset}")]
    DigestMismatch { offset: u64 },

    #[error("row {row} out of range for image of height {height}")]
    RowOutOfRange { row: u32, height: u32 },

    #[error(transparent)]
    Lazy(#[from] LazyError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn expected_label(expected: &Option<u64>) -> String {
    expected.map_or_else(|| "more than u64::MAX".to_owned(), |n| n.to_string())
}

impl DecodeError {
    /// The decode error behind a failed eager skip or deferred load.
    #[must_use]
    pub fn deferred_cause(&self) -> Option<&DecodeError> {
        match self {
            Self::Lazy(err) => err.operation_error()?.downcast_ref::<DecodeError>(),
            _ => None,
        }
    }
}
