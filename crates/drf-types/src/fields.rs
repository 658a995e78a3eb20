use std::io::Read;

use drf_wire::WireError;
use drf_wire::varint::{decode_varint, push_varint, read_varint};

use crate::error::TypeError;

/// Field wire types within a region body.
///
/// Every field is a tag-length-value triple:
///
/// ```text
///   field_id (varint) │ wire_type (varint) │ payload
/// ```
///
/// ```text
/// ┌──────┬──────────┬────────────────────────────────┐
/// │ Wire │ Type     │ Payload format                 │
/// ├──────┼──────────┼────────────────────────────────┤
/// │ 0    │ Varint   │ Single varint value            │
/// │ 1    │ Bytes    │ Varint length + raw bytes      │
/// │ 2    │ Nested   │ Varint length + nested TLV     │
/// └──────┴──────────┴────────────────────────────────┘
/// ```
///
/// Unknown field ids are skipped by wire type, so newer writers can add
/// fields without breaking older readers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldWireType {
    Varint = 0,
    Bytes = 1,
    Nested = 2,
}

impl FieldWireType {
    /// # Errors
    ///
    /// [`TypeError::UnknownFieldWireType`] for values outside 0..=2.
    pub fn from_raw(value: u64) -> Result<Self, TypeError> {
        match value {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Bytes),
            2 => Ok(Self::Nested),
            other => Err(TypeError::UnknownFieldWireType { value: other }),
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────

pub fn encode_varint_field(buf: &mut Vec<u8>, field_id: u64, value: u64) {
    push_varint(buf, field_id);
    push_varint(buf, FieldWireType::Varint as u64);
    push_varint(buf, value);
}

pub fn encode_bytes_field(buf: &mut Vec<u8>, field_id: u64, data: &[u8]) {
    push_varint(buf, field_id);
    push_varint(buf, FieldWireType::Bytes as u64);
    push_varint(buf, data.len() as u64);
    buf.extend_from_slice(data);
}

/// `nested_data` must already be a TLV sequence.
pub fn encode_nested_field(buf: &mut Vec<u8>, field_id: u64, nested_data: &[u8]) {
    push_varint(buf, field_id);
    push_varint(buf, FieldWireType::Nested as u64);
    push_varint(buf, nested_data.len() as u64);
    buf.extend_from_slice(nested_data);
}

// ── Slice decoding ────────────────────────────────────────────────────

/// A decoded field header: the field id and its wire type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldHeader {
    pub field_id: u64,
    pub wire_type: FieldWireType,
}

/// Decode `field_id + wire_type` from the front of `buf`.
///
/// Returns `(header, bytes_consumed)`.
///
/// # Errors
///
/// Wire errors for truncated varints, or
/// [`TypeError::UnknownFieldWireType`].
pub fn decode_field_header(buf: &[u8]) -> Result<(FieldHeader, usize), TypeError> {
    let (field_id, n) = decode_varint(buf)?;
    let (wire_type_raw, m) = decode_varint(&buf[n..])?;
    let wire_type = FieldWireType::from_raw(wire_type_raw)?;
    Ok((
        FieldHeader {
            field_id,
            wire_type,
        },
        n + m,
    ))
}

/// Read a length-prefixed payload. `bytes_consumed` includes the prefix.
///
/// # Errors
///
/// [`WireError::UnexpectedEof`] if the declared length runs past `buf`.
pub fn decode_bytes_value(buf: &[u8]) -> Result<(&[u8], usize), TypeError> {
    let (len, n) = decode_varint(buf)?;
    let data = usize::try_from(len)
        .ok()
        .and_then(|len| buf.get(n..n.checked_add(len)?))
        .ok_or(WireError::UnexpectedEof { offset: buf.len() })?;
    Ok((data, n + data.len()))
}

/// A raw TLV field borrowed from a body slice.
///
/// For `Varint` fields `data` holds the varint bytes (see
/// [`RawField::varint`]); for `Bytes` and `Nested` it is the payload with
/// the length prefix already stripped.
#[derive(Clone, Copy, Debug)]
pub struct RawField<'a> {
    pub field_id: u64,
    pub wire_type: FieldWireType,
    pub data: &'a [u8],
}

impl RawField<'_> {
    /// Decode the value of a varint field.
    ///
    /// # Errors
    ///
    /// Propagates varint errors; a non-varint field yields
    /// [`TypeError::UnknownFieldWireType`] with its actual wire type.
    pub fn varint(&self) -> Result<u64, TypeError> {
        if self.wire_type != FieldWireType::Varint {
            return Err(TypeError::UnknownFieldWireType {
                value: self.wire_type as u64,
            });
        }
        Ok(decode_varint(self.data)?.0)
    }

    /// Decode a varint field that must fit in a `u32`.
    ///
    /// # Errors
    ///
    /// [`TypeError::ValueOutOfRange`] if the value is wider than 32 bits.
    pub fn varint_u32(&self, field: &'static str) -> Result<u32, TypeError> {
        let value = self.varint()?;
        u32::try_from(value).map_err(|_| TypeError::ValueOutOfRange { field, value })
    }

    pub fn lossy_string(&self) -> String {
        String::from_utf8_lossy(self.data).into_owned()
    }
}

/// Cursor over the TLV fields of a body slice.
///
/// ```text
///   let mut fields = FieldReader::new(body);
///   while let Some(field) = fields.next_field()? {
///       match field.field_id { 1 => ..., _ => {} }   // unknown ids fall through
///   }
/// ```
pub struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Read the next field, or `None` once the slice is exhausted.
    ///
    /// # Errors
    ///
    /// Wire or type errors if the field header or payload is malformed.
    pub fn next_field(&mut self) -> Result<Option<RawField<'a>>, TypeError> {
        let remaining = &self.buf[self.pos..];
        if remaining.is_empty() {
            return Ok(None);
        }

        let (header, header_len) = decode_field_header(remaining)?;
        let payload = &remaining[header_len..];
        let (data, consumed) = match header.wire_type {
            FieldWireType::Varint => {
                let (_, n) = decode_varint(payload)?;
                (&payload[..n], n)
            }
            FieldWireType::Bytes | FieldWireType::Nested => decode_bytes_value(payload)?,
        };
        self.pos += header_len + consumed;

        Ok(Some(RawField {
            field_id: header.field_id,
            wire_type: header.wire_type,
            data,
        }))
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }
}

// ── Stream decoding ───────────────────────────────────────────────────
//
// The lazy IMAGE path reads the leading header field straight off the
// document stream so it never has to buffer the payload behind it.

/// Read `field_id + wire_type` from a stream.
///
/// Returns `(header, bytes_consumed)`.
///
/// # Errors
///
/// Wire errors for short reads or bad varints, or
/// [`TypeError::UnknownFieldWireType`].
pub fn read_field_header<R: Read + ?Sized>(r: &mut R) -> Result<(FieldHeader, usize), TypeError> {
    let (field_id, n) = read_varint(r)?;
    let (wire_type_raw, m) = read_varint(r)?;
    Ok((
        FieldHeader {
            field_id,
            wire_type: FieldWireType::from_raw(wire_type_raw)?,
        },
        n + m,
    ))
}

/// Read a length-prefixed payload from a stream, refusing anything
/// longer than `limit` bytes before allocating for it.
///
/// Returns `(payload, bytes_consumed)`; the count includes the prefix.
///
/// # Errors
///
/// - [`TypeError::ValueOutOfRange`] if the declared length exceeds `limit`.
/// - [`WireError::UnexpectedEof`] if the stream ends early.
pub fn read_bytes_value<R: Read + ?Sized>(
    r: &mut R,
    limit: usize,
) -> Result<(Vec<u8>, usize), TypeError> {
    let (len, n) = read_varint(r)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= limit)
        .ok_or(TypeError::ValueOutOfRange {
            field: "length",
            value: len,
        })?;
    let mut data = vec![0u8; len];
    r.read_exact(&mut data)
        .map_err(|e| WireError::from_read(e, n))?;
    Ok((data, n + len))
}
