/// Byte-level errors raised while reading or writing the DRF envelope.
///
/// Offsets are relative to whatever the caller handed in: the start of a
/// slice for the slice readers, or the first byte consumed for the
/// `Read`-based readers.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Varint encoding exceeded 10 bytes without terminating.
    #[error("varint too long: exceeded 10-byte limit")]
    VarintTooLong,

    /// Input ended before a complete varint, header, or frame could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Magic number did not match "DRF\0".
    #[error("invalid magic number: expected 0x44524600, got {found:#010X}")]
    InvalidMagic { found: u32 },

    /// Unsupported format version.
    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// Reserved header byte was non-zero.
    #[error("reserved field at offset {offset} was {value:#04X}, expected 0x00")]
    ReservedNonZero { offset: usize, value: u8 },

    /// A region frame declared a length that does not fit in memory.
    #[error("region length {len} does not fit in usize")]
    LengthOverflow { len: u64 },

    /// I/O error during read or write.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Map an I/O error from a `read_exact` into the wire taxonomy.
    ///
    /// A short read becomes [`WireError::UnexpectedEof`] at `offset`;
    /// anything else is surfaced unchanged as [`WireError::Io`].
    pub fn from_read(err: std::io::Error, offset: usize) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof { offset }
        } else {
            Self::Io(err)
        }
    }
}
