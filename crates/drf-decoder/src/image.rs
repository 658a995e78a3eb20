use std::cell::Ref;
use std::io::{Read, Seek};

use drf_lazy::{Lazy, LazyBinding, LazyTarget, LoadState, Operation, SeekStream, SharedStream};
use drf_types::enums::PixelFormat;
use drf_types::error::TypeError;
use drf_types::fields::{FieldWireType, read_bytes_value, read_field_header};
use drf_types::image::{ImageBody, ImageHeader, image_field};
use drf_wire::WireError;
use drf_wire::region_frame::{RegionFlags, RegionFrameHeader, region_type};

use crate::config::DecoderConfig;
use crate::decompression;
use crate::error::DecodeError;

/// Operation names offered by [`ImageRegion`].
pub mod op {
    /// Read the frame and image header, then seek past the body.
    pub const SKIP: &str = "skip";
    /// Read the body and decode pixels. Args: `max_pixel_bytes: u64`,
    /// `verify_digest: bool`.
    pub const PARSE: &str = "parse";
}

/// Members of [`LazyImage`] answered from the header read by `skip`.
pub const EXEMPT_MEMBERS: [&str; 6] = [
    "pixel_format",
    "width",
    "height",
    "alt_text",
    "payload_len",
    "flags",
];

/// Largest nested image header the eager skip will read.
const HEADER_SIZE_LIMIT: u64 = 64 * 1024;

/// Slack allowed on top of the pixel cap for the header, digest and
/// field framing inside an IMAGE body.
const BODY_OVERHEAD_LIMIT: u64 = 64 * 1024;

/// The parse target for one IMAGE region.
///
/// `skip` fills in the header and stored length; `parse` fills in the
/// pixels. Both expect the stream at the start of the region frame.
#[derive(Debug, Default)]
pub struct ImageRegion {
    header: Option<ImageHeader>,
    flags: RegionFlags,
    content_len: u64,
    pixels: Vec<u8>,
}

impl ImageRegion {
    #[must_use]
    pub fn header(&self) -> Option<&ImageHeader> {
        self.header.as_ref()
    }

    #[must_use]
    pub fn flags(&self) -> RegionFlags {
        self.flags
    }

    /// Stored body length, as declared by the frame.
    #[must_use]
    pub fn content_len(&self) -> u64 {
        self.content_len
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn require_header(&self) -> Result<&ImageHeader, DecodeError> {
        self.header
            .as_ref()
            .ok_or(DecodeError::Type(TypeError::MissingRequiredField { field: "header" }))
    }

    /// Read the frame header at the current position and check it is an
    /// IMAGE. Returns the frame, its header length, and its start offset.
    fn read_frame<R: Read + Seek>(
        &mut self,
        stream: &mut R,
    ) -> Result<(RegionFrameHeader, u64, u64), DecodeError> {
        let offset = stream.current_position()?;
        let (frame, frame_len) = RegionFrameHeader::read_from_stream(stream)?.ok_or(
            DecodeError::NotAnImage {
                offset,
                found: region_type::END,
            },
        )?;
        if frame.region_type != region_type::IMAGE {
            return Err(DecodeError::NotAnImage {
                offset,
                found: frame.region_type,
            });
        }
        self.flags = frame.flags;
        self.content_len = frame.content_len;
        Ok((frame, frame_len as u64, offset))
    }

    fn skip<R: Read + Seek>(&mut self, stream: &mut R) -> Result<(), DecodeError> {
        let (frame, frame_len, offset) = self.read_frame(stream)?;
        let body_start = offset + frame_len;
        let body_end = body_start
            .checked_add(frame.content_len)
            .ok_or(WireError::LengthOverflow {
                len: frame.content_len,
            })?;

        // A header is a few varints plus alt text.
        let limit = usize::try_from(frame.content_len.min(HEADER_SIZE_LIMIT)).unwrap_or(0);
        let (field, n) = read_field_header(stream)?;
        if field.field_id != image_field::HEADER || field.wire_type != FieldWireType::Nested {
            return Err(TypeError::UnexpectedField {
                expected: image_field::HEADER,
                found: field.field_id,
            }
            .into());
        }
        let (header_bytes, m) = read_bytes_value(stream, limit)?;
        if (n + m) as u64 > frame.content_len {
            return Err(WireError::UnexpectedEof {
                offset: usize::try_from(frame.content_len).unwrap_or(usize::MAX),
            }
            .into());
        }
        let header = ImageHeader::decode(&header_bytes)?;

        log::trace!(
            "image at {offset}: {}x{} {}, {} stored bytes",
            header.width,
            header.height,
            header.pixel_format.name(),
            frame.content_len
        );
        self.header = Some(header);
        stream.seek_to(body_end)?;
        Ok(())
    }

    fn parse<R: Read + Seek>(
        &mut self,
        stream: &mut R,
        max_pixel_bytes: usize,
        verify_digest: bool,
    ) -> Result<(), DecodeError> {
        let (frame, _, offset) = self.read_frame(stream)?;

        let body_limit = (max_pixel_bytes as u64).saturating_add(BODY_OVERHEAD_LIMIT);
        if frame.content_len > body_limit {
            return Err(DecodeError::RegionTooLarge {
                offset,
                size: frame.content_len,
                limit: max_pixel_bytes,
            });
        }
        let mut body = vec![0u8; frame.body_len()?];
        stream
            .read_exact(&mut body)
            .map_err(|e| WireError::from_read(e, 0))?;
        let parts = ImageBody::decode(&body)?;

        let payload = parts
            .payload
            .ok_or(TypeError::MissingRequiredField { field: "payload" })?;
        let pixels = if frame.flags.is_compressed() {
            decompression::decompress(payload, max_pixel_bytes)?
        } else if payload.len() > max_pixel_bytes {
            return Err(DecodeError::RegionTooLarge {
                offset,
                size: payload.len() as u64,
                limit: max_pixel_bytes,
            });
        } else {
            payload.to_vec()
        };

        let expected = parts.header.expected_len();
        if expected != Some(pixels.len() as u64) {
            return Err(DecodeError::PixelSizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }

        if frame.flags.has_digest() {
            let digest = parts
                .digest
                .ok_or(TypeError::MissingRequiredField { field: "digest" })?;
            if verify_digest && blake3::hash(&pixels).as_bytes()[..] != *digest {
                return Err(DecodeError::DigestMismatch { offset });
            }
        }

        log::trace!("image at {offset}: decoded {} pixel bytes", pixels.len());
        self.header = Some(parts.header);
        self.pixels = pixels;
        Ok(())
    }
}

impl<R: Read + Seek> LazyTarget<R> for ImageRegion {
    type Error = DecodeError;

    const OPERATIONS: &'static [&'static str] = &[op::SKIP, op::PARSE];

    fn invoke(&mut self, operation: &Operation, stream: &mut R) -> Result<(), DecodeError> {
        match operation.name() {
            op::SKIP => self.skip(stream),
            _ => {
                let max_pixel_bytes = operation
                    .u64_arg(0)
                    .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
                let verify_digest = operation.bool_arg(1).unwrap_or(true);
                self.parse(stream, max_pixel_bytes, verify_digest)
            }
        }
    }

    fn target_name() -> &'static str {
        "ImageRegion"
    }
}

/// An IMAGE region whose pixels are decoded on first use.
///
/// Format, dimensions, alt text and stored length come from the header
/// the initial pass already read and never trigger a load. Anything that
/// needs pixels loads them once, from the region's own offset, and puts
/// the document stream back where it was.
///
/// Clones share one underlying region.
pub struct LazyImage<R> {
    inner: Lazy<ImageRegion, R>,
}

impl<R> Clone for LazyImage<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> std::fmt::Debug for LazyImage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LazyImage").field(&self.inner).finish()
    }
}

impl<R: Read + Seek> LazyImage<R> {
    /// Bind an image at the stream's current position, which must be the
    /// start of an IMAGE frame. Leaves the stream just past the region.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Lazy`] wrapping the skip step's failure.
    pub fn bind(stream: &SharedStream<R>, config: &DecoderConfig) -> Result<Self, DecodeError> {
        let parse = Operation::new(op::PARSE)
            .arg(config.max_pixel_bytes as u64)
            .arg(config.verify_digests);
        let inner = LazyBinding::new(ImageRegion::default(), stream)?
            .run_eagerly(op::SKIP)?
            .defer_load(parse)?
            .exempt(EXEMPT_MEMBERS)
            .wrap()?;
        Ok(Self { inner })
    }

    fn header_field<U>(&self, member: &str, f: impl FnOnce(&ImageHeader) -> U) -> Result<U, DecodeError> {
        let region = self.inner.get(member)?;
        Ok(f(region.require_header()?))
    }

    /// # Errors
    ///
    /// Only [`LazyError::Reentrant`](drf_lazy::LazyError::Reentrant) in practice.
    pub fn pixel_format(&self) -> Result<PixelFormat, DecodeError> {
        self.header_field("pixel_format", |h| h.pixel_format)
    }

    /// # Errors
    ///
    /// As [`pixel_format`](Self::pixel_format).
    pub fn width(&self) -> Result<u32, DecodeError> {
        self.header_field("width", |h| h.width)
    }

    /// # Errors
    ///
    /// As [`pixel_format`](Self::pixel_format).
    pub fn height(&self) -> Result<u32, DecodeError> {
        self.header_field("height", |h| h.height)
    }

    /// # Errors
    ///
    /// As [`pixel_format`](Self::pixel_format).
    pub fn alt_text(&self) -> Result<String, DecodeError> {
        self.header_field("alt_text", |h| h.alt_text.clone())
    }

    /// Bytes the region occupies in the document, compressed or not.
    ///
    /// # Errors
    ///
    /// As [`pixel_format`](Self::pixel_format).
    pub fn payload_len(&self) -> Result<u64, DecodeError> {
        Ok(self.inner.get("payload_len")?.content_len())
    }

    /// Frame flags: whether the payload is compressed and carries a digest.
    ///
    /// # Errors
    ///
    /// As [`pixel_format`](Self::pixel_format).
    pub fn flags(&self) -> Result<RegionFlags, DecodeError> {
        Ok(self.inner.get("flags")?.flags())
    }

    /// Decoded pixels, row-major, no padding.
    ///
    /// # Errors
    ///
    /// The deferred load's error on the access that triggers it. After a
    /// failed load this returns whatever the load left behind (usually
    /// nothing).
    pub fn pixels(&self) -> Result<Ref<'_, [u8]>, DecodeError> {
        let region = self.inner.get("pixels")?;
        Ok(Ref::map(region, |r| r.pixels.as_slice()))
    }

    /// # Errors
    ///
    /// As [`pixels`](Self::pixels).
    pub fn with_pixels<U>(&self, f: impl FnOnce(&[u8]) -> U) -> Result<U, DecodeError> {
        Ok(self.inner.with("with_pixels", |r| f(&r.pixels))?)
    }

    /// One row of pixels.
    ///
    /// # Errors
    ///
    /// As [`pixels`](Self::pixels), or [`DecodeError::RowOutOfRange`].
    pub fn row(&self, y: u32) -> Result<Ref<'_, [u8]>, DecodeError> {
        let region = self.inner.get("row")?;
        let header = region.require_header()?;
        let out_of_range = DecodeError::RowOutOfRange {
            row: y,
            height: header.height,
        };
        if y >= header.height {
            return Err(out_of_range);
        }
        let stride = u64::from(header.width) * header.pixel_format.bytes_per_pixel();
        let range = usize::try_from(stride * u64::from(y))
            .ok()
            .zip(usize::try_from(stride).ok())
            .and_then(|(start, len)| Some(start..start.checked_add(len)?))
            .filter(|range| range.end <= region.pixels.len());
        match range {
            Some(range) => Ok(Ref::map(region, |r| &r.pixels[range])),
            None => Err(out_of_range),
        }
    }

    /// Load now if not loaded yet.
    ///
    /// # Errors
    ///
    /// As [`pixels`](Self::pixels).
    pub fn force(&self) -> Result<(), DecodeError> {
        Ok(self.inner.force()?)
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.inner.state()
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    /// Offset of the region frame in the document stream.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.inner.start_offset()
    }

    /// The underlying wrapper, for generic lazy-binding tooling.
    #[must_use]
    pub fn as_lazy(&self) -> &Lazy<ImageRegion, R> {
        &self.inner
    }
}
