use drf_lazy::SharedStream;
use drf_types::text::TextRegion;
use drf_wire::header::DocumentHeader;

use crate::error::DecodeError;
use crate::image::LazyImage;

/// One region of a document, in wire order.
#[derive(Debug)]
pub enum Region<R> {
    Text { offset: u64, text: TextRegion },
    Image(LazyImage<R>),
    /// A region type this reader doesn't know; its body was seeked over.
    Unknown { type_id: u8, offset: u64, len: u64 },
}

impl<R: std::io::Read + std::io::Seek> Region<R> {
    /// Offset of the region's frame in the document stream.
    pub fn offset(&self) -> u64 {
        match self {
            Self::Text { offset, .. } | Self::Unknown { offset, .. } => *offset,
            Self::Image(image) => image.start_offset(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "TEXT",
            Self::Image(_) => "IMAGE",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }

    pub fn as_image(&self) -> Option<&LazyImage<R>> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    /// One-line summary. Never loads an image.
    ///
    /// # Errors
    ///
    /// Only if an image is being loaded while this is called.
    pub fn describe(&self) -> Result<String, DecodeError> {
        Ok(match self {
            Self::Text { text, .. } => {
                format!("TEXT    {:?} ({} bytes)", text.title, text.content.len())
            }
            Self::Image(image) => format!(
                "IMAGE   {}x{} {} {:?} ({} bytes, {})",
                image.width()?,
                image.height()?,
                image.pixel_format()?.name(),
                image.alt_text()?,
                image.payload_len()?,
                image.state(),
            ),
            Self::Unknown { type_id, len, .. } => {
                format!("UNKNOWN type={type_id:#04X} ({len} bytes)")
            }
        })
    }
}

/// A read document: header, regions, and the stream the lazy images
/// load from.
///
/// The stream handle is kept so the caller can keep reading from it,
/// or take it back with [`into_stream`](Self::into_stream) once every
/// image handle has been dropped.
#[derive(Debug)]
pub struct Document<R> {
    pub header: DocumentHeader,
    pub regions: Vec<Region<R>>,
    stream: SharedStream<R>,
}

impl<R: std::io::Read + std::io::Seek> Document<R> {
    pub(crate) fn new(header: DocumentHeader, regions: Vec<Region<R>>, stream: SharedStream<R>) -> Self {
        Self {
            header,
            regions,
            stream,
        }
    }

    pub fn stream(&self) -> &SharedStream<R> {
        &self.stream
    }

    pub fn images(&self) -> impl Iterator<Item = &LazyImage<R>> {
        self.regions.iter().filter_map(Region::as_image)
    }

    /// Images whose deferred load has not been triggered.
    pub fn unloaded_images(&self) -> usize {
        self.images().filter(|image| !image.is_loaded()).count()
    }

    /// Load every image that hasn't been loaded yet, stopping at the
    /// first failure.
    ///
    /// # Errors
    ///
    /// The first image load error.
    pub fn force_all(&self) -> Result<(), DecodeError> {
        self.images().try_for_each(LazyImage::force)
    }

    /// Drop the regions and take the stream back.
    ///
    /// # Errors
    ///
    /// Returns the shared handle if image clones are still alive elsewhere.
    pub fn into_stream(self) -> Result<R, SharedStream<R>> {
        drop(self.regions);
        self.stream.try_into_inner()
    }
}
