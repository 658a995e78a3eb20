/// Implementation of `drf validate`.
///
/// Reads the document with every image loaded during the pass, so each
/// payload is decompressed, size-checked and digest-checked.
///
/// ```text
/// ✓ Header: valid (DRF v1.0)
/// ✓ Regions: 4 regions parsed successfully
/// ✓ Images: 2 images decoded, 1 digest verified
/// ✓ Sentinel: END region present
/// ```
///
/// ```text
/// ✗ Error: image at offset 21 — pixel digest mismatch in image at offset 21
/// ```
use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result, anyhow};
use drf_decoder::{DecodeError, DecoderConfig, DocumentReader, LazyPolicy};
use drf_lazy::LazyError;

use crate::ValidateArgs;

/// # Errors
///
/// The file can't be opened or any part of it fails to decode.
pub fn run(args: &ValidateArgs, config: &DecoderConfig) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;
    let config = DecoderConfig {
        lazy_policy: LazyPolicy::Never,
        ..config.clone()
    };

    match DocumentReader::new(BufReader::new(file), config.clone()).read() {
        Ok(doc) => {
            let images = doc.images().count();
            let digests = doc
                .images()
                .filter(|image| image.flags().is_ok_and(|flags| flags.has_digest()))
                .count();
            println!(
                "✓ Header: valid (DRF v{}.{})",
                doc.header.version_major, doc.header.version_minor
            );
            println!(
                "✓ Regions: {} region{} parsed successfully",
                doc.regions.len(),
                if doc.regions.len() == 1 { "" } else { "s" }
            );
            println!(
                "✓ Images: {images} image{} decoded, {digests} digest{} {}",
                if images == 1 { "" } else { "s" },
                if digests == 1 { "" } else { "s" },
                if config.verify_digests { "verified" } else { "present (not verified)" }
            );
            println!("✓ Sentinel: END region present");
            Ok(())
        }
        Err(e) => {
            println!("✗ Error: {}", diagnostic(&e));
            Err(anyhow!("validation failed"))
        }
    }
}

fn diagnostic(e: &DecodeError) -> String {
    match e {
        DecodeError::InvalidHeader(inner) => format!("invalid header — {inner}"),
        DecodeError::MissingEndSentinel => "missing END sentinel".to_string(),
        DecodeError::TrailingData { extra_bytes } => {
            format!("trailing data after END ({extra_bytes} unexpected bytes)")
        }
        DecodeError::Lazy(LazyError::DeferredLoad { offset, .. }) => match e.deferred_cause() {
            Some(cause) => format!("image at offset {offset} — {cause}"),
            None => e.to_string(),
        },
        DecodeError::Lazy(LazyError::EagerStep { .. }) => match e.deferred_cause() {
            Some(cause) => format!("image header — {cause}"),
            None => e.to_string(),
        },
        other => other.to_string(),
    }
}
