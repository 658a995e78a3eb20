use crate::enums::PixelFormat;
use crate::error::TypeError;
use crate::fields::{FieldReader, FieldWireType, encode_bytes_field, encode_nested_field, encode_varint_field};

/// Field ids of an IMAGE region body.
///
/// ```text
/// ┌──────────┬───────────┬─────────┬──────────────────────────────────┐
/// │ Field ID │ Wire Type │ Name    │ Description                      │
/// ├──────────┼───────────┼─────────┼──────────────────────────────────┤
/// │ 1        │ Nested    │ header  │ ImageHeader, always first        │
/// │ 2        │ Bytes     │ payload │ Pixels, raw or zstd (flag bit 0) │
/// │ 3        │ Bytes     │ digest  │ BLAKE3 of decoded pixels (bit 1) │
/// └──────────┴───────────┴─────────┴──────────────────────────────────┘
/// ```
pub mod image_field {
    pub const HEADER: u64 = 1;
    pub const PAYLOAD: u64 = 2;
    pub const DIGEST: u64 = 3;
}

/// Length of the BLAKE3 digest carried in field 3.
pub const DIGEST_LEN: usize = 32;

/// The metadata at the front of an IMAGE body.
///
/// Everything here is cheap to read, which is what lets the image's
/// dimensions be answered without decoding the payload.
///
/// ```text
/// ┌──────────┬───────────┬──────────────┐
/// │ Field ID │ Wire Type │ Name         │
/// ├──────────┼───────────┼──────────────┤
/// │ 1        │ Varint    │ pixel_format │
/// │ 2        │ Varint    │ width        │
/// │ 3        │ Varint    │ height       │
/// │ 4        │ Bytes     │ alt_text     │
/// └──────────┴───────────┴──────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub alt_text: String,
}

impl ImageHeader {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint_field(&mut buf, 1, u64::from(self.pixel_format.to_wire_byte()));
        encode_varint_field(&mut buf, 2, u64::from(self.width));
        encode_varint_field(&mut buf, 3, u64::from(self.height));
        encode_bytes_field(&mut buf, 4, self.alt_text.as_bytes());
        buf
    }

    /// # Errors
    ///
    /// Malformed fields, an unknown pixel format, dimensions wider than
    /// 32 bits, or a missing format / width / height. Alt text is optional.
    pub fn decode(buf: &[u8]) -> Result<Self, TypeError> {
        let mut pixel_format = None;
        let mut width = None;
        let mut height = None;
        let mut alt_text = String::new();

        let mut fields = FieldReader::new(buf);
        while let Some(field) = fields.next_field()? {
            match field.field_id {
                1 => {
                    let raw = field.varint()?;
                    let byte = u8::try_from(raw).map_err(|_| TypeError::ValueOutOfRange {
                        field: "pixel_format",
                        value: raw,
                    })?;
                    pixel_format = Some(PixelFormat::from_wire_byte(byte)?);
                }
                2 => width = Some(field.varint_u32("width")?),
                3 => height = Some(field.varint_u32("height")?),
                4 => alt_text = field.lossy_string(),
                _ => {}
            }
        }

        Ok(Self {
            pixel_format: pixel_format.ok_or(TypeError::MissingRequiredField {
                field: "pixel_format",
            })?,
            width: width.ok_or(TypeError::MissingRequiredField { field: "width" })?,
            height: height.ok_or(TypeError::MissingRequiredField { field: "height" })?,
            alt_text,
        })
    }

    /// Decoded payload size in bytes: `width × height × bytes_per_pixel`.
    ///
    /// `None` if the product overflows `u64`.
    pub fn expected_len(&self) -> Option<u64> {
        u64::from(self.width)
            .checked_mul(u64::from(self.height))?
            .checked_mul(self.pixel_format.bytes_per_pixel())
    }
}

/// A borrowed view over a fully-read IMAGE body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBody<'a> {
    pub header: ImageHeader,
    pub payload: Option<&'a [u8]>,
    pub digest: Option<&'a [u8]>,
}

impl<'a> ImageBody<'a> {
    /// Serialize an IMAGE body: header first, then payload, then the
    /// optional digest.
    pub fn encode(header: &ImageHeader, payload: &[u8], digest: Option<&[u8; DIGEST_LEN]>) -> Vec<u8> {
        let mut buf = Vec::with_capacity(payload.len() + 64);
        encode_nested_field(&mut buf, image_field::HEADER, &header.encode());
        encode_bytes_field(&mut buf, image_field::PAYLOAD, payload);
        if let Some(digest) = digest {
            encode_bytes_field(&mut buf, image_field::DIGEST, digest);
        }
        buf
    }

    /// Split a complete IMAGE body into its parts.
    ///
    /// The header must be the first field; payload and digest may be
    /// absent here and are checked by whoever needs them.
    ///
    /// # Errors
    ///
    /// [`TypeError::UnexpectedField`] if the body doesn't open with a
    /// nested header, plus any field decoding error.
    pub fn decode(buf: &'a [u8]) -> Result<Self, TypeError> {
        let mut fields = FieldReader::new(buf);

        let first = fields
            .next_field()?
            .ok_or(TypeError::MissingRequiredField { field: "header" })?;
        if first.field_id != image_field::HEADER || first.wire_type != FieldWireType::Nested {
            return Err(TypeError::UnexpectedField {
                expected: image_field::HEADER,
                found: first.field_id,
            });
        }
        let header = ImageHeader::decode(first.data)?;

        let mut payload = None;
        let mut digest = None;
        while let Some(field) = fields.next_field()? {
            match field.field_id {
                image_field::PAYLOAD => payload = Some(field.data),
                image_field::DIGEST => digest = Some(field.data),
                _ => {}
            }
        }

        Ok(Self {
            header,
            payload,
            digest,
        })
    }
}
