use drf_types::enums::PixelFormat;
use drf_types::image::{DIGEST_LEN, ImageBody, ImageHeader};
use drf_types::text::TextRegion;
use drf_wire::header::{DocumentHeader, HEADER_SIZE};
use drf_wire::region_frame::{RegionFlags, RegionFrame, region_type};

use crate::compression::{self, COMPRESSION_THRESHOLD};
use crate::error::EncodeError;

/// Maximum region body size (16 MiB). Larger bodies produce an
/// [`EncodeError::RegionTooLarge`] during `.encode()`.
pub const MAX_REGION_BODY_SIZE: usize = 16 * 1024 * 1024;

/// DRF encoder: builds a document from text and image regions.
///
/// `add_*` methods append a region; `with_*` modifiers apply to the
/// most recently added image. Everything is validated in
/// [`encode`](Self::encode), so a chain never has to be broken up to
/// handle errors.
///
/// ```rust
/// use drf_encoder::DocumentEncoder;
/// use drf_types::PixelFormat;
///
/// let doc = DocumentEncoder::new()
///     .add_text("caption", b"A flat grey square.")
///     .add_image(PixelFormat::Gray8, 32, 32, "grey", &[0x80; 32 * 32])
///     .with_compression()
///     .with_digest()
///     .encode()
///     .unwrap();
/// assert_eq!(&doc[..4], b"DRF\0");
/// ```
///
/// # Output layout
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────┐
/// │ [8 bytes]    │ Document header (magic, version, rsv)    │
/// │ [N bytes]    │ Region 0 frame (type + flags + len + body)│
/// │ [N bytes]    │ Region 1 frame ...                       │
/// │ [4 bytes]    │ END sentinel (type=0xFF, flags=0, len=0) │
/// └──────────────┴──────────────────────────────────────────┘
/// ```
///
/// Image bodies always open with the header field, so a reader can
/// learn the format and dimensions without touching the payload.
pub struct DocumentEncoder {
    regions: Vec<PendingRegion>,
    compress_all_images: bool,
    digest_all_images: bool,
    /// First modifier that found no image to attach to.
    misapplied: Option<&'static str>,
}

enum PendingRegion {
    Text(TextRegion),
    Image(PendingImage),
}

struct PendingImage {
    header: ImageHeader,
    pixels: Vec<u8>,
    compress: bool,
    digest: bool,
}

impl DocumentEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            compress_all_images: false,
            digest_all_images: false,
            misapplied: None,
        }
    }

    /// Add a TEXT region. Text is always decoded eagerly by readers.
    pub fn add_text(&mut self, title: &str, content: &[u8]) -> &mut Self {
        self.regions.push(PendingRegion::Text(TextRegion {
            title: title.to_string(),
            content: content.to_vec(),
        }));
        self
    }

    /// Add an IMAGE region.
    ///
    /// `pixels` must hold exactly `width × height × bpp` bytes, row-major
    /// with no padding; this is checked in `.encode()`.
    pub fn add_image(
        &mut self,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        alt_text: &str,
        pixels: &[u8],
    ) -> &mut Self {
        self.regions.push(PendingRegion::Image(PendingImage {
            header: ImageHeader {
                pixel_format,
                width,
                height,
                alt_text: alt_text.to_string(),
            },
            pixels: pixels.to_vec(),
            compress: self.compress_all_images,
            digest: self.digest_all_images,
        }));
        self
    }

    /// zstd-compress the most recent image's payload.
    ///
    /// Applied only when the payload is at least
    /// [`COMPRESSION_THRESHOLD`] bytes and compression actually shrinks
    /// it; otherwise the payload is stored raw and the flag stays clear.
    pub fn with_compression(&mut self) -> &mut Self {
        if let Some(image) = self.last_image("with_compression") {
            image.compress = true;
        }
        self
    }

    /// Store a BLAKE3 digest of the most recent image's pixels.
    pub fn with_digest(&mut self) -> &mut Self {
        if let Some(image) = self.last_image("with_digest") {
            image.digest = true;
        }
        self
    }

    /// Compress every image added so far and every later one.
    pub fn compress_images(&mut self) -> &mut Self {
        self.compress_all_images = true;
        for region in &mut self.regions {
            if let PendingRegion::Image(image) = region {
                image.compress = true;
            }
        }
        self
    }

    /// Digest every image added so far and every later one.
    pub fn digest_images(&mut self) -> &mut Self {
        self.digest_all_images = true;
        for region in &mut self.regions {
            if let PendingRegion::Image(image) = region {
                image.digest = true;
            }
        }
        self
    }

    /// Serialize all regions into a complete document.
    ///
    /// # Errors
    ///
    /// - [`EncodeError::InvalidTarget`] if a `with_*` modifier had no image.
    /// - [`EncodeError::EmptyDocument`] if no regions were added.
    /// - [`EncodeError::PixelSizeMismatch`] for a wrongly sized image.
    /// - [`EncodeError::RegionTooLarge`] if a body exceeds 16 MiB.
    /// - [`EncodeError::Wire`] / [`EncodeError::Io`] from frame writing.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if let Some(modifier) = self.misapplied {
            return Err(EncodeError::InvalidTarget { modifier });
        }
        if self.regions.is_empty() {
            return Err(EncodeError::EmptyDocument);
        }

        let mut output = Vec::with_capacity(HEADER_SIZE + self.regions.len() * 256 + 4);
        output.extend_from_slice(&DocumentHeader::new().to_bytes());

        for pending in &self.regions {
            let frame = match pending {
                PendingRegion::Text(text) => RegionFrame {
                    region_type: region_type::TEXT,
                    flags: RegionFlags::NONE,
                    body: text.encode_body(),
                },
                PendingRegion::Image(image) => Self::image_frame(image)?,
            };
            if frame.body.len() > MAX_REGION_BODY_SIZE {
                return Err(EncodeError::RegionTooLarge {
                    size: frame.body.len(),
                    limit: MAX_REGION_BODY_SIZE,
                });
            }
            frame.write_to(&mut output)?;
        }

        RegionFrame::end().write_to(&mut output)?;
        Ok(output)
    }

    fn image_frame(image: &PendingImage) -> Result<RegionFrame, EncodeError> {
        let header = &image.header;
        let expected = header.expected_len();
        if expected != Some(image.pixels.len() as u64) {
            return Err(EncodeError::PixelSizeMismatch {
                width: header.width,
                height: header.height,
                format: header.pixel_format.name(),
                expected,
                actual: image.pixels.len(),
            });
        }

        let mut flags = RegionFlags::NONE;

        let digest: Option<[u8; DIGEST_LEN]> = image.digest.then(|| blake3::hash(&image.pixels).into());
        if digest.is_some() {
            flags = flags.with(RegionFlags::HAS_DIGEST);
        }

        let compressed = if image.compress && image.pixels.len() >= COMPRESSION_THRESHOLD {
            compression::compress(&image.pixels)
        } else {
            None
        };
        if compressed.is_some() {
            flags = flags.with(RegionFlags::COMPRESSED);
        }
        let payload = compressed.as_deref().unwrap_or(&image.pixels);

        Ok(RegionFrame {
            region_type: region_type::IMAGE,
            flags,
            body: ImageBody::encode(header, payload, digest.as_ref()),
        })
    }

    fn last_image(&mut self, modifier: &'static str) -> Option<&mut PendingImage> {
        match self.regions.last_mut() {
            Some(PendingRegion::Image(image)) => Some(image),
            _ => {
                self.misapplied.get_or_insert(modifier);
                None
            }
        }
    }
}

impl Default for DocumentEncoder {
    fn default() -> Self {
        Self::new()
    }
}
