/// Implementation of `drf inspect`.
///
/// Reads the document with the configured lazy policy and lists every
/// region. Listing never loads an image; the summary line for an image
/// comes entirely from its header. With `--load`, each still-deferred
/// image is then loaded and the stream position is printed around the
/// load to show it is put back.
///
/// # Output format
///
/// ```text
/// Header: DRF v1.0, 3 regions
/// Region 0 @ 8: TEXT    "intro" (5 bytes)
/// Region 1 @ 21: IMAGE   640x480 rgb8 "photo" (921630 bytes, unloaded)
///          loaded 921600 pixel bytes, stream 921672 → 921672
/// Region 2 @ 921651: UNKNOWN type=0x42 (17 bytes)
/// ---
/// 0 of 1 images unloaded
/// ```
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use drf_decoder::{DecoderConfig, DocumentReader};

use crate::InspectArgs;

/// # Errors
///
/// The file can't be opened, the document is malformed, or a `--load`
/// fails.
pub fn run(args: &InspectArgs, config: &DecoderConfig) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;
    let doc = DocumentReader::new(BufReader::new(file), config.clone())
        .read()
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    println!(
        "Header: DRF v{}.{}, {} region{}",
        doc.header.version_major,
        doc.header.version_minor,
        doc.regions.len(),
        if doc.regions.len() == 1 { "" } else { "s" }
    );

    for (idx, region) in doc.regions.iter().enumerate() {
        if let Some(target) = args.region
            && idx != target
        {
            continue;
        }

        println!("Region {idx} @ {}: {}", region.offset(), region.describe()?);

        if args.load
            && let Some(image) = region.as_image()
            && !image.is_loaded()
        {
            let before = doc.stream().current_position()?;
            image
                .force()
                .with_context(|| format!("loading region {idx}"))?;
            let after = doc.stream().current_position()?;
            println!(
                "         loaded {} pixel bytes, stream {before} → {after}",
                image.with_pixels(<[u8]>::len)?
            );
        }
    }

    let images = doc.images().count();
    println!("---");
    println!("{} of {images} images unloaded", doc.unloaded_images());
    Ok(())
}
