//! Shared fixtures for the DRF integration tests and benchmarks.

use std::io::{self, Cursor, Read, Seek, SeekFrom};

use drf_decoder::{DecoderConfig, LazyPolicy};
use drf_encoder::DocumentEncoder;
use drf_types::PixelFormat;
use drf_wire::region_frame::{RegionFlags, RegionFrame};

/// A stream wrapper that counts how the document is touched.
///
/// `stream_position` is answered without a seek so position queries
/// never show up in `seeks`.
pub struct CountingStream<R> {
    inner: R,
    pub seeks: usize,
    pub bytes_read: u64,
}

impl<R> CountingStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            seeks: 0,
            bytes_read: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl CountingStream<Cursor<Vec<u8>>> {
    pub fn over(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read> Read for CountingStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl<R: Seek> Seek for CountingStream<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seeks += 1;
        self.inner.seek(pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }
}

/// Deterministic, mildly compressible pixel data.
#[must_use]
pub fn gradient(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7) % 251) as u8).collect()
}

/// Text, a small image, a large compressed image with digest, text.
///
/// ```text
///   0  TEXT   "intro"
///   1  IMAGE  rgb8 4x2 "tiny"
///   2  IMAGE  rgba8 256x256 "photo"       compressed, digested
///   3  TEXT   "outro"
/// ```
///
/// The photo compresses well, so read it with [`lazy_config`] to be
/// sure it is deferred.
#[must_use]
pub fn sample_document() -> Vec<u8> {
    DocumentEncoder::new()
        .add_text("intro", b"hello")
        .add_image(PixelFormat::Rgb8, 4, 2, "tiny", &gradient(24))
        .add_image(PixelFormat::Rgba8, 256, 256, "photo", &gradient(256 * 256 * 4))
        .with_compression()
        .with_digest()
        .add_text("outro", b"bye")
        .encode()
        .expect("sample document is valid")
}

/// Default settings, but every image deferred.
#[must_use]
pub fn lazy_config() -> DecoderConfig {
    DecoderConfig {
        lazy_policy: LazyPolicy::Always,
        ..DecoderConfig::default()
    }
}

/// Insert a raw frame just before the END sentinel of `doc`.
#[must_use]
pub fn insert_before_end(doc: &[u8], frame: &RegionFrame) -> Vec<u8> {
    let split = doc.len().saturating_sub(4);
    let mut out = doc[..split].to_vec();
    frame.write_to(&mut out).expect("writing to a Vec");
    out.extend_from_slice(&doc[split..]);
    out
}

/// A frame with an arbitrary region type and body.
#[must_use]
pub fn raw_frame(region_type: u8, flags: RegionFlags, body: Vec<u8>) -> RegionFrame {
    RegionFrame {
        region_type,
        flags,
        body,
    }
}
