use drf_wire::WireError;

/// Errors that can occur while building a DRF document.
///
/// ```text
///   EncodeError
///   ├── EmptyDocument       ← no regions were added before .encode()
///   ├── PixelSizeMismatch   ← pixels don't match width × height × bpp
///   ├── RegionTooLarge      ← single region body exceeds size limit
///   ├── InvalidTarget       ← image modifier with no image to apply to
///   ├── Wire(WireError)     ← from drf-wire serialization
///   └── Io(std::io::Error)  ← from underlying I/O writes
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("no regions have been added to the encoder")]
    EmptyDocument,

    #[error("{width}x{height} {format} image needs {} pixel bytes, got {actual}", expected_label(.expected))]
    PixelSizeMismatch {
        width: u32,
        height: u32,
        format: &'static str,
        expected: Option<u64>,
        actual: usize,
    },

    #[error("region body exceeds maximum size ({size} bytes, limit {limit})")]
    RegionTooLarge { size: usize, limit: usize },

    #[error("{modifier} called but the most recent region is not an image")]
    InvalidTarget { modifier: &'static str },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn expected_label(expected: &Option<u64>) -> String {
    expected.map_or_else(|| "more than u64::MAX".to_owned(), |n| n.to_string())
}
