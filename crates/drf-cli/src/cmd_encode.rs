/// Implementation of `drf encode`.
///
/// Builds a document from a JSON manifest.
///
/// # Manifest format
///
/// ```json
/// {
///   "regions": [
///     { "type": "text", "title": "intro", "content": "Hello." },
///     { "type": "image", "format": "rgb8", "width": 640, "height": 480,
///       "alt_text": "photo", "pixels_file": "photo.raw",
///       "compress": true, "digest": true },
///     { "type": "image", "format": "gray8", "width": 64, "height": 64,
///       "fill": 128 }
///   ]
/// }
/// ```
///
/// ```text
/// ┌────────┬────────────────────────────────────────────────────────────┐
/// │ Type   │ Fields                                                     │
/// ├────────┼────────────────────────────────────────────────────────────┤
/// │ text   │ title, content (or content_file)                           │
/// │ image  │ format, width, height, pixels_file (or fill), alt_text,    │
/// │        │ compress, digest                                           │
/// └────────┴────────────────────────────────────────────────────────────┘
/// ```
///
/// File paths are relative to the manifest's directory. `--compress` and
/// `--digest` apply to every image regardless of per-image settings.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use drf_encoder::DocumentEncoder;
use drf_types::PixelFormat;

use crate::EncodeArgs;

// ── Manifest serde types ──────────────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct Manifest {
    regions: Vec<ManifestRegion>,
}

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ManifestRegion {
    Text {
        title: String,
        content: Option<String>,
        content_file: Option<String>,
    },
    Image {
        /// `gray8` | `rgb8` | `rgba8`.
        format: String,
        width: u32,
        height: u32,
        #[serde(default)]
        alt_text: String,
        pixels_file: Option<String>,
        /// Every pixel byte set to this value.
        fill: Option<u8>,
        #[serde(default)]
        compress: bool,
        #[serde(default)]
        digest: bool,
    },
}

/// # Errors
///
/// The manifest can't be read or parsed, a referenced file is missing,
/// or encoding fails.
pub fn run(args: &EncodeArgs) -> Result<()> {
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("invalid manifest {}", args.input.display()))?;
    let base = args.input.parent().unwrap_or(Path::new("."));

    let mut encoder = DocumentEncoder::new();
    if args.compress {
        encoder.compress_images();
    }
    if args.digest {
        encoder.digest_images();
    }

    for (idx, region) in manifest.regions.into_iter().enumerate() {
        match region {
            ManifestRegion::Text {
                title,
                content,
                content_file,
            } => {
                let content = match (content, content_file) {
                    (Some(inline), _) => inline.into_bytes(),
                    (None, Some(path)) => read_relative(base, &path)?,
                    (None, None) => Vec::new(),
                };
                encoder.add_text(&title, &content);
            }
            ManifestRegion::Image {
                format,
                width,
                height,
                alt_text,
                pixels_file,
                fill,
                compress,
                digest,
            } => {
                let pixel_format = PixelFormat::from_name(&format)
                    .ok_or_else(|| anyhow!("region {idx}: unknown pixel format {format:?}"))?;
                let pixels = match (pixels_file, fill) {
                    (Some(path), _) => read_relative(base, &path)?,
                    (None, Some(value)) => {
                        let len = u64::from(width)
                            .checked_mul(u64::from(height))
                            .and_then(|n| n.checked_mul(pixel_format.bytes_per_pixel()))
                            .and_then(|n| usize::try_from(n).ok())
                            .ok_or_else(|| anyhow!("region {idx}: image too large"))?;
                        vec![value; len]
                    }
                    (None, None) => bail!("region {idx}: image needs pixels_file or fill"),
                };
                encoder.add_image(pixel_format, width, height, &alt_text, &pixels);
                if compress {
                    encoder.with_compression();
                }
                if digest {
                    encoder.with_digest();
                }
            }
        }
    }

    let bytes = encoder.encode().context("encoding failed")?;
    fs::write(&args.output, &bytes)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("wrote {} bytes to {}", bytes.len(), args.output.display());
    Ok(())
}

fn read_relative(base: &Path, path: &str) -> Result<Vec<u8>> {
    let full = base.join(path);
    fs::read(&full).with_context(|| format!("cannot read {}", full.display()))
}
