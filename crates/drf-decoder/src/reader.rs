use std::io::{Read, Seek, SeekFrom};

use drf_lazy::{SeekStream, SharedStream};
use drf_types::text::TextRegion;
use drf_wire::WireError;
use drf_wire::header::DocumentHeader;
use drf_wire::region_frame::{RegionFrameHeader, region_type};

use crate::config::DecoderConfig;
use crate::document::{Document, Region};
use crate::error::DecodeError;
use crate::image::LazyImage;

/// Reads a DRF document from a seekable stream, leaving large images
/// for later.
///
/// One pass over the stream, in document order:
///
///   1. **Header**: 8 bytes, validated.
///   2. **Regions**: for each frame,
///      - TEXT is read and decoded on the spot.
///      - IMAGE is bound lazily: its header is read, its body skipped.
///        If the [`LazyPolicy`](crate::LazyPolicy) doesn't defer it, the
///        load is forced right away through the same binding.
///      - Anything else is seeked over and kept as `Region::Unknown`.
///   3. **Termination**: an END sentinel is required. Bytes after it are
///      an error unless `allow_trailing_data` is set.
///
/// Reading starts at the stream's current position, so a document
/// embedded in a larger file works as long as the stream is placed at
/// its first byte.
///
/// ```rust
/// use std::io::Cursor;
/// use drf_decoder::{DecoderConfig, DocumentReader};
/// use drf_encoder::DocumentEncoder;
/// use drf_types::PixelFormat;
///
/// let bytes = DocumentEncoder::new()
///     .add_image(PixelFormat::Gray8, 128, 128, "big", &[0; 128 * 128])
///     .encode()
///     .unwrap();
/// let doc = DocumentReader::new(Cursor::new(bytes), DecoderConfig::default())
///     .read()
///     .unwrap();
/// let image = doc.images().next().unwrap();
/// assert!(!image.is_loaded());
/// assert_eq!(image.pixels().unwrap().len(), 128 * 128);
/// ```
pub struct DocumentReader<R> {
    stream: SharedStream<R>,
    config: DecoderConfig,
}

impl<R: Read + Seek> DocumentReader<R> {
    pub fn new(stream: R, config: DecoderConfig) -> Self {
        Self::from_shared(SharedStream::new(stream), config)
    }

    /// Read from a stream that other bindings already share.
    pub fn from_shared(stream: SharedStream<R>, config: DecoderConfig) -> Self {
        Self { stream, config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn stream(&self) -> &SharedStream<R> {
        &self.stream
    }

    /// Walk the document and return its regions.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidHeader`] for a bad header.
    /// - [`DecodeError::MissingEndSentinel`] if the stream ends first.
    /// - [`DecodeError::TrailingData`] for bytes after END.
    /// - [`DecodeError::RegionTooLarge`] for an oversized TEXT body.
    /// - [`DecodeError::Lazy`] if an image's skip step fails, or if a
    ///   non-deferred image fails to load.
    /// - Wire, type and I/O errors from the frames themselves.
    pub fn read(&self) -> Result<Document<R>, DecodeError> {
        let header = {
            let mut stream = self.stream.borrow_mut()?;
            DocumentHeader::read_from_stream(&mut *stream).map_err(DecodeError::InvalidHeader)?
        };

        let mut regions = Vec::new();
        loop {
            let offset = self.stream.current_position()?;
            let next = {
                let mut stream = self.stream.borrow_mut()?;
                RegionFrameHeader::read_from_stream(&mut *stream)
            };
            let (frame, frame_len) = match next {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(WireError::UnexpectedEof { offset: 0 }) => {
                    return Err(DecodeError::MissingEndSentinel);
                }
                Err(e) => return Err(e.into()),
            };
            log::trace!(
                "frame at {offset}: type {:#04X}, flags {:#04X}, {} bytes",
                frame.region_type,
                frame.flags.raw(),
                frame.content_len
            );

            let region = match frame.region_type {
                region_type::TEXT => self.read_text(offset, &frame)?,
                region_type::IMAGE => self.bind_image(offset, &frame)?,
                type_id => {
                    let len = frame.content_len;
                    log::debug!("region {} at {offset}: skipping unknown type {type_id:#04X}", regions.len());
                    let end = (offset + frame_len as u64)
                        .checked_add(len)
                        .ok_or(WireError::LengthOverflow { len })?;
                    self.stream.seek_to(end)?;
                    Region::Unknown { type_id, offset, len }
                }
            };
            regions.push(region);
        }

        if !self.config.allow_trailing_data {
            self.check_trailing()?;
        }

        log::debug!(
            "read {} regions, {} images deferred",
            regions.len(),
            regions
                .iter()
                .filter_map(Region::as_image)
                .filter(|image| !image.is_loaded())
                .count()
        );
        Ok(Document::new(header, regions, self.stream.clone()))
    }

    fn read_text(&self, offset: u64, frame: &RegionFrameHeader) -> Result<Region<R>, DecodeError> {
        let len = frame.body_len()?;
        if len > self.config.max_text_bytes {
            return Err(DecodeError::RegionTooLarge {
                offset,
                size: frame.content_len,
                limit: self.config.max_text_bytes,
            });
        }
        let mut body = vec![0u8; len];
        self.stream
            .borrow_mut()?
            .read_exact(&mut body)
            .map_err(|e| WireError::from_read(e, 0))?;
        Ok(Region::Text {
            offset,
            text: TextRegion::decode_body(&body)?,
        })
    }

    fn bind_image(&self, offset: u64, frame: &RegionFrameHeader) -> Result<Region<R>, DecodeError> {
        self.stream.seek_to(offset)?;
        let image = LazyImage::bind(&self.stream, &self.config)?;
        if self.config.lazy_policy.defers(frame.content_len) {
            log::debug!("image at {offset}: {} bytes deferred", frame.content_len);
        } else {
            log::debug!("image at {offset}: {} bytes loaded eagerly", frame.content_len);
            image.force()?;
        }
        Ok(Region::Image(image))
    }

    fn check_trailing(&self) -> Result<(), DecodeError> {
        let mut stream = self.stream.borrow_mut()?;
        let here = stream.current_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek_to(here)?;
        if end > here {
            return Err(DecodeError::TrailingData {
                extra_bytes: end - here,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LazyPolicy;
    use drf_encoder::DocumentEncoder;
    use drf_lazy::LoadState;
    use drf_types::PixelFormat;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        DocumentEncoder::new()
            .add_text("intro", b"hello")
            .add_image(PixelFormat::Gray8, 100, 100, "large", &[3; 10_000])
            .add_image(PixelFormat::Rgb8, 2, 2, "small", &[4; 12])
            .add_text("outro", b"bye")
            .encode()
            .unwrap()
    }

    fn read(bytes: Vec<u8>, config: DecoderConfig) -> Result<Document<Cursor<Vec<u8>>>, DecodeError> {
        DocumentReader::new(Cursor::new(bytes), config).read()
    }

    #[test]
    fn threshold_defers_only_large_images() {
        let doc = read(sample(), DecoderConfig::default()).unwrap();
        let states: Vec<_> = doc.images().map(LazyImage::state).collect();
        assert_eq!(states, [LoadState::Unloaded, LoadState::Loaded]);
        assert!(matches!(&doc.regions[3], Region::Text { text, .. } if text.title == "outro"));
    }

    #[test]
    fn never_policy_loads_everything() {
        let doc = read(sample(), DecoderConfig::eager()).unwrap();
        assert_eq!(doc.unloaded_images(), 0);
    }

    #[test]
    fn late_load_leaves_stream_at_document_end() {
        let bytes = sample();
        let len = bytes.len() as u64;
        let config = DecoderConfig {
            lazy_policy: LazyPolicy::Always,
            ..DecoderConfig::default()
        };
        let doc = read(bytes, config).unwrap();
        assert_eq!(doc.stream().current_position().unwrap(), len);

        let large = doc.images().next().unwrap();
        assert_eq!(large.pixels().unwrap().len(), 10_000);
        assert_eq!(doc.stream().current_position().unwrap(), len);
    }

    #[test]
    fn describe_never_loads() {
        let doc = read(sample(), DecoderConfig::default()).unwrap();
        let lines: Vec<String> = doc.regions.iter().map(|r| r.describe().unwrap()).collect();
        assert_eq!(lines[1], r#"IMAGE   100x100 gray8 "large" (10024 bytes, unloaded)"#);
        assert_eq!(doc.unloaded_images(), 1);
    }

    #[test]
    fn unknown_region_is_skipped() {
        let sample = sample();
        // A type-0x42 region right after the header.
        let mut bytes = sample[..8].to_vec();
        bytes.extend_from_slice(&[0x42, 0x00, 0x03, 0xAA, 0xBB, 0xCC]);
        bytes.extend_from_slice(&sample[8..]);
        let doc = read(bytes, DecoderConfig::default()).unwrap();
        assert!(matches!(
            doc.regions[0],
            Region::Unknown { type_id: 0x42, offset: 8, len: 3 }
        ));
        assert_eq!(doc.regions.len(), 5);
    }

    #[test]
    fn missing_end_sentinel() {
        let mut bytes = sample();
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(
            read(bytes, DecoderConfig::default()),
            Err(DecodeError::MissingEndSentinel)
        ));
    }

    #[test]
    fn trailing_data_rejected_unless_allowed() {
        let mut bytes = sample();
        bytes.extend_from_slice(b"junk");
        assert!(matches!(
            read(bytes.clone(), DecoderConfig::default()),
            Err(DecodeError::TrailingData { extra_bytes: 4 })
        ));
        let config = DecoderConfig {
            allow_trailing_data: true,
            ..DecoderConfig::default()
        };
        assert_eq!(read(bytes, config).unwrap().regions.len(), 4);
    }

    #[test]
    fn bad_magic_is_invalid_header() {
        let mut bytes = sample();
        bytes[0] = b'X';
        assert!(matches!(
            read(bytes, DecoderConfig::default()),
            Err(DecodeError::InvalidHeader(WireError::InvalidMagic { .. }))
        ));
    }

    #[test]
    fn eager_load_failure_fails_the_read() {
        let mut bytes = DocumentEncoder::new()
            .add_image(PixelFormat::Gray8, 2, 2, "", &[1; 4])
            .with_digest()
            .encode()
            .unwrap();
        let last_digest_byte = bytes.len() - 5;
        bytes[last_digest_byte] ^= 1;
        let err = read(bytes, DecoderConfig::default()).err().unwrap();
        assert!(matches!(err.deferred_cause(), Some(DecodeError::DigestMismatch { .. })));
    }

    #[test]
    fn into_stream_after_regions_dropped() {
        let bytes = sample();
        let doc = read(bytes.clone(), DecoderConfig::default()).unwrap();
        assert_eq!(doc.into_stream().unwrap().into_inner(), bytes);
    }
}
