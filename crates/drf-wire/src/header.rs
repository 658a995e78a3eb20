use std::io::Read;

use crate::error::WireError;

/// Magic number: ASCII "DRF\0", stored as raw bytes so byte order never
/// comes into it.
pub const DRF_MAGIC: [u8; 4] = *b"DRF\0";

/// Total header size in bytes (fixed).
pub const HEADER_SIZE: usize = 8;

/// Current format version major.
pub const VERSION_MAJOR: u8 = 1;

/// Current format version minor.
pub const VERSION_MINOR: u8 = 0;

/// DRF document header — the first 8 bytes of every document.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────┐
/// │ Offset │ Size    │ Description                      │
/// ├────────┼─────────┼──────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ Magic: "DRF\0" (0x44524600)      │
/// │ 0x04   │ 1 byte  │ Version major                    │
/// │ 0x05   │ 1 byte  │ Version minor                    │
/// │ 0x06   │ 2 bytes │ Reserved (0x0000)                │
/// └────────┴─────────┴──────────────────────────────────┘
/// ```
///
/// The first region frame starts at offset 8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentHeader {
    pub version_major: u8,
    pub version_minor: u8,
}

impl Default for DocumentHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
        }
    }

    /// Serialize the header into its 8-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&DRF_MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf
    }

    /// Parse a header from the first 8 bytes of `buf`.
    ///
    /// Validation order is magic, then version, then reserved bytes, so
    /// a non-DRF file is reported as such rather than as a version
    /// mismatch.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if `buf` is shorter than 8 bytes.
    /// - [`WireError::InvalidMagic`] if the magic doesn't match.
    /// - [`WireError::UnsupportedVersion`] for any major version but 1.
    /// - [`WireError::ReservedNonZero`] if a reserved byte is set.
    pub fn read_from(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        if buf[0..4] != DRF_MAGIC {
            let found = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
            return Err(WireError::InvalidMagic { found });
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major != VERSION_MAJOR {
            return Err(WireError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        for offset in 6..HEADER_SIZE {
            if buf[offset] != 0x00 {
                return Err(WireError::ReservedNonZero {
                    offset,
                    value: buf[offset],
                });
            }
        }

        Ok(Self {
            version_major,
            version_minor,
        })
    }

    /// Read and validate the header from a stream positioned at offset 0.
    ///
    /// # Errors
    ///
    /// Same as [`read_from`](Self::read_from); a short stream is
    /// reported as [`WireError::UnexpectedEof`].
    pub fn read_from_stream<R: Read + ?Sized>(r: &mut R) -> Result<Self, WireError> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf)
            .map_err(|e| WireError::from_read(e, 0))?;
        Self::read_from(&buf)
    }
}
