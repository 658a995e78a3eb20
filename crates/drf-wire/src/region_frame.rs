use std::io::{Read, Write};

use crate::error::WireError;
use crate::varint::{decode_varint, encode_varint, read_varint, MAX_VARINT_BYTES};

/// Per-region flags bitfield.
///
/// Bit layout:
///   bit 0 = payload is zstd-compressed
///   bit 1 = a BLAKE3 digest of the decoded payload follows it
///   bits 2-7 = reserved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegionFlags(u8);

impl RegionFlags {
    pub const NONE: Self = Self(0);
    pub const COMPRESSED: Self = Self(0b0000_0001);
    pub const HAS_DIGEST: Self = Self(0b0000_0010);

    pub fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_compressed(self) -> bool {
        self.0 & Self::COMPRESSED.0 != 0
    }

    pub fn has_digest(self) -> bool {
        self.0 & Self::HAS_DIGEST.0 != 0
    }
}

/// Known region type IDs as they appear on the wire.
pub mod region_type {
    pub const TEXT: u8 = 0x01;
    pub const IMAGE: u8 = 0x02;
    pub const END: u8 = 0xFF;
}

/// The envelope in front of every region body, without the body itself.
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ region_type  (varint)                            │
/// │ flags        (uint8)                             │
/// │ content_len  (varint)                            │
/// │ body         [content_len bytes]                 │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// Lazy readers only ever need this part up front: with `content_len`
/// known, the body can be skipped by a single seek.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionFrameHeader {
    pub region_type: u8,
    pub flags: RegionFlags,
    pub content_len: u64,
}

impl RegionFrameHeader {
    /// Read a frame header from a stream positioned at a frame boundary.
    ///
    /// Returns `Some((header, bytes_consumed))` for a normal region, or
    /// `None` once the END sentinel has been read. The END frame's flags
    /// byte and zero length are consumed before returning, so the stream
    /// is left just past the sentinel.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if the stream ends inside the header.
    /// - [`WireError::VarintTooLong`] for a malformed varint.
    pub fn read_from_stream<R: Read + ?Sized>(
        r: &mut R,
    ) -> Result<Option<(Self, usize)>, WireError> {
        let (type_raw, mut consumed) = read_varint(r)?;
        #[allow(clippy::cast_possible_truncation)]
        let region_type = type_raw as u8;

        let mut flags_byte = [0u8; 1];
        r.read_exact(&mut flags_byte)
            .map_err(|e| WireError::from_read(e, consumed))?;
        consumed += 1;

        let (content_len, n) = read_varint(r).map_err(|e| match e {
            WireError::UnexpectedEof { offset } => WireError::UnexpectedEof {
                offset: consumed + offset,
            },
            other => other,
        })?;
        consumed += n;

        if region_type == region_type::END {
            return Ok(None);
        }

        Ok(Some((
            Self {
                region_type,
                flags: RegionFlags::from_raw(flags_byte[0]),
                content_len,
            },
            consumed,
        )))
    }

    /// `content_len` as a `usize`, for sizing an in-memory body buffer.
    ///
    /// # Errors
    ///
    /// [`WireError::LengthOverflow`] on targets where it doesn't fit.
    pub fn body_len(&self) -> Result<usize, WireError> {
        usize::try_from(self.content_len).map_err(|_| WireError::LengthOverflow {
            len: self.content_len,
        })
    }
}

/// A complete region frame: envelope plus body bytes.
///
/// This is what the encoder produces. Decoders normally read the
/// [`RegionFrameHeader`] from the stream instead and decide separately
/// whether the body is worth reading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionFrame {
    pub region_type: u8,
    pub flags: RegionFlags,
    pub body: Vec<u8>,
}

impl RegionFrame {
    /// The END sentinel frame: type 0xFF, no flags, empty body.
    #[must_use]
    pub fn end() -> Self {
        Self {
            region_type: region_type::END,
            flags: RegionFlags::NONE,
            body: Vec::new(),
        }
    }

    /// Write this frame to `w`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Io`] if the writer fails.
    pub fn write_to(&self, w: &mut impl Write) -> Result<usize, WireError> {
        let mut varint_buf = [0u8; MAX_VARINT_BYTES];
        let mut written = 0;

        let n = encode_varint(u64::from(self.region_type), &mut varint_buf);
        w.write_all(&varint_buf[..n])?;
        written += n;

        w.write_all(&[self.flags.raw()])?;
        written += 1;

        let n = encode_varint(self.body.len() as u64, &mut varint_buf);
        w.write_all(&varint_buf[..n])?;
        written += n;

        w.write_all(&self.body)?;
        written += self.body.len();

        Ok(written)
    }

    /// Read a complete frame from the front of `buf`.
    ///
    /// Returns `None` for the END sentinel, otherwise the frame and the
    /// number of bytes it occupied.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnexpectedEof`] if `buf` is too short.
    /// - [`WireError::VarintTooLong`] if a varint is malformed.
    pub fn read_from(buf: &[u8]) -> Result<Option<(Self, usize)>, WireError> {
        let mut cursor = 0;

        let (type_raw, n) = decode_varint(buf)?;
        cursor += n;
        #[allow(clippy::cast_possible_truncation)]
        let region_type = type_raw as u8;
        if region_type == region_type::END {
            return Ok(None);
        }

        let flags = RegionFlags::from_raw(
            *buf.get(cursor)
                .ok_or(WireError::UnexpectedEof { offset: cursor })?,
        );
        cursor += 1;

        let (content_len, n) = decode_varint(&buf[cursor..])?;
        cursor += n;

        let len = usize::try_from(content_len)
            .map_err(|_| WireError::LengthOverflow { len: content_len })?;
        let body_end = cursor
            .checked_add(len)
            .filter(|&end| end <= buf.len())
            .ok_or(WireError::UnexpectedEof { offset: buf.len() })?;
        let body = buf[cursor..body_end].to_vec();

        Ok(Some((
            Self {
                region_type,
                flags,
                body,
            },
            body_end,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame_bytes(frame: &RegionFrame) -> Vec<u8> {
        let mut buf = Vec::new();
        frame.write_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn stream_header_matches_written_frame() {
        let frame = RegionFrame {
            region_type: region_type::IMAGE,
            flags: RegionFlags::COMPRESSED.with(RegionFlags::HAS_DIGEST),
            body: vec![0xAB; 300],
        };
        let bytes = frame_bytes(&frame);

        let mut cursor = Cursor::new(&bytes);
        let (header, consumed) = RegionFrameHeader::read_from_stream(&mut cursor)
            .unwrap()
            .unwrap();
        assert_eq!(header.region_type, region_type::IMAGE);
        assert!(header.flags.is_compressed());
        assert!(header.flags.has_digest());
        assert_eq!(header.content_len, 300);
        // 1 type byte + 1 flags byte + 2-byte length varint
        assert_eq!(consumed, 4);
        assert_eq!(consumed as u64 + header.content_len, bytes.len() as u64);
    }

    #[test]
    fn end_sentinel_is_fully_consumed_from_stream() {
        let mut bytes = frame_bytes(&RegionFrame::end());
        bytes.push(0x99);
        let mut cursor = Cursor::new(&bytes);
        assert!(RegionFrameHeader::read_from_stream(&mut cursor).unwrap().is_none());
        // [0xFF, 0x01] type + flags + zero length
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn truncated_stream_header_reports_offset() {
        // Type and flags present, length varint missing.
        let mut cursor = Cursor::new(vec![region_type::TEXT, 0x00]);
        assert!(matches!(
            RegionFrameHeader::read_from_stream(&mut cursor),
            Err(WireError::UnexpectedEof { offset: 2 })
        ));
    }

    #[test]
    fn slice_read_consumes_exactly_one_frame() {
        let first = RegionFrame {
            region_type: region_type::TEXT,
            flags: RegionFlags::NONE,
            body: b"first".to_vec(),
        };
        let second = RegionFrame {
            region_type: region_type::IMAGE,
            flags: RegionFlags::NONE,
            body: b"second".to_vec(),
        };
        let mut buf = frame_bytes(&first);
        buf.extend(frame_bytes(&second));

        let (parsed, consumed) = RegionFrame::read_from(&buf).unwrap().unwrap();
        assert_eq!(parsed, first);
        let (parsed, _) = RegionFrame::read_from(&buf[consumed..]).unwrap().unwrap();
        assert_eq!(parsed, second);
    }

    #[test]
    fn slice_read_rejects_short_body() {
        let bytes = frame_bytes(&RegionFrame {
            region_type: region_type::TEXT,
            flags: RegionFlags::NONE,
            body: vec![0; 100],
        });
        let truncated = &bytes[..bytes.len() - 10];
        assert!(matches!(
            RegionFrame::read_from(truncated),
            Err(WireError::UnexpectedEof { .. })
        ));
    }
}
