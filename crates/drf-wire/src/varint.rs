use std::io::Read;

use crate::error::WireError;

/// Maximum number of bytes a u64 varint can occupy: ceil(64 / 7).
pub const MAX_VARINT_BYTES: usize = 10;

/// Encode a `u64` as an unsigned LEB128 varint into `buf`.
///
/// Returns the number of bytes written (1–10). A 10-byte buffer is
/// always enough.
///
/// # Panics
///
/// Panics if `buf` is shorter than the encoding.
///
/// | Value   | Encoded bytes        |
/// |---------|----------------------|
/// | 0       | `[0x00]`             |
/// | 127     | `[0x7F]`             |
/// | 128     | `[0x80, 0x01]`       |
/// | 255     | `[0xFF, 0x01]`       |
/// | 16384   | `[0x80, 0x80, 0x01]` |
pub fn encode_varint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf[i] = byte;
        i += 1;
        if value == 0 {
            return i;
        }
    }
}

/// Append the varint encoding of `value` to a growable buffer.
pub fn push_varint(buf: &mut Vec<u8>, value: u64) {
    let mut scratch = [0u8; MAX_VARINT_BYTES];
    let n = encode_varint(value, &mut scratch);
    buf.extend_from_slice(&scratch[..n]);
}

/// Decode an unsigned LEB128 varint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] after 10 continuation bytes.
/// - [`WireError::UnexpectedEof`] if the slice ends mid-varint.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_BYTES {
            return Err(WireError::VarintTooLong);
        }
        result |= u64::from(byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(WireError::UnexpectedEof { offset: buf.len() })
}

/// Read one varint directly from a byte stream, one byte at a time.
///
/// This is the path the lazy loaders use: they sit on a seekable
/// stream and must not read past the varint into the next field.
/// Returns `(value, bytes_consumed)`.
///
/// # Errors
///
/// - [`WireError::VarintTooLong`] after 10 continuation bytes.
/// - [`WireError::UnexpectedEof`] if the stream ends mid-varint; the
///   offset is the number of bytes consumed by this call.
/// - [`WireError::Io`] for any other read failure.
pub fn read_varint<R: Read + ?Sized>(r: &mut R) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    let mut byte = [0u8; 1];

    for i in 0..MAX_VARINT_BYTES {
        r.read_exact(&mut byte)
            .map_err(|e| WireError::from_read(e, i))?;
        result |= u64::from(byte[0] & 0x7F) << shift;
        shift += 7;
        if byte[0] & 0x80 == 0 {
            return Ok((result, i + 1));
        }
    }

    Err(WireError::VarintTooLong)
}
