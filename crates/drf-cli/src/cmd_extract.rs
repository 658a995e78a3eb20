/// Implementation of `drf extract`.
///
/// Reads the document with every image left lazy, then loads only the
/// requested one. The pixels are written raw: row-major, no header, in
/// the image's own pixel format.
///
/// ```text
/// wrote 921600 bytes (640x480 rgb8) to photo.raw
/// ```
use std::fs::{self, File};
use std::io::BufReader;

use anyhow::{Context, Result, bail};
use drf_decoder::{DecoderConfig, DocumentReader, LazyPolicy};

use crate::ExtractArgs;

/// # Errors
///
/// The index is out of range or not an image, the image fails to load,
/// or the output can't be written.
pub fn run(args: &ExtractArgs, config: &DecoderConfig) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;
    let config = DecoderConfig {
        lazy_policy: LazyPolicy::Always,
        ..config.clone()
    };
    let doc = DocumentReader::new(BufReader::new(file), config)
        .read()
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let Some(region) = doc.regions.get(args.region) else {
        bail!(
            "region {} out of range ({} regions)",
            args.region,
            doc.regions.len()
        );
    };
    let Some(image) = region.as_image() else {
        bail!("region {} is {}, not IMAGE", args.region, region.label());
    };

    let pixels = image
        .pixels()
        .with_context(|| format!("loading region {}", args.region))?;
    fs::write(&args.output, &*pixels)
        .with_context(|| format!("cannot write {}", args.output.display()))?;

    println!(
        "wrote {} bytes ({}x{} {}) to {}",
        pixels.len(),
        image.width()?,
        image.height()?,
        image.pixel_format()?.name(),
        args.output.display()
    );
    Ok(())
}
