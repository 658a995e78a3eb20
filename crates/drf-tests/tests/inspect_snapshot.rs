//! Region listings rendered to insta snapshots.
//!
//! The listing is what `drf inspect` prints: one line per region with
//! its offset and [`Region::describe`] summary. Producing it must never
//! load an image, so the snapshot also pins which images the default
//! threshold leaves unloaded.
//!
//! The snapshots are inline. After a deliberate format change, accept
//! the new output with `cargo insta review`.

use std::fmt::Write as _;
use std::io::Cursor;

use drf_decoder::{DecoderConfig, Document, DocumentReader, Region};
use drf_encoder::DocumentEncoder;
use drf_tests::{gradient, insert_before_end, raw_frame};
use drf_types::PixelFormat;
use drf_wire::region_frame::RegionFlags;
use insta::assert_snapshot;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn listing<R: std::io::Read + std::io::Seek>(doc: &Document<R>) -> String {
    let mut out = String::new();
    for (i, region) in doc.regions.iter().enumerate() {
        let summary = region
            .describe()
            .unwrap_or_else(|e| panic!("describe failed for region {i}: {e}"));
        if i > 0 {
            out.push('\n');
        }
        write!(out, "{i} @ {}: {summary}", region.offset()).unwrap();
    }
    out
}

fn mixed_document() -> Vec<u8> {
    let doc = DocumentEncoder::new()
        .add_text("intro", b"hello")
        .add_image(PixelFormat::Rgb8, 4, 2, "tiny", &gradient(24))
        .add_image(PixelFormat::Gray8, 100, 50, "wide", &gradient(5000))
        .encode()
        .unwrap();
    insert_before_end(&doc, &raw_frame(0x42, RegionFlags::NONE, vec![7, 7, 7]))
}

// ── Listings ──────────────────────────────────────────────────────────────────

#[test]
fn default_threshold_listing() {
    let doc = DocumentReader::new(Cursor::new(mixed_document()), DecoderConfig::default())
        .read()
        .unwrap();
    assert_snapshot!(listing(&doc), @r#"
    0 @ 8: TEXT    "intro" (5 bytes)
    1 @ 27: IMAGE   4x2 rgb8 "tiny" (46 bytes, loaded)
    2 @ 76: IMAGE   100x50 gray8 "wide" (5023 bytes, unloaded)
    3 @ 5103: UNKNOWN type=0x42 (3 bytes)
    "#);
    assert_eq!(doc.unloaded_images(), 1);
}

#[test]
fn listing_after_forcing_everything() {
    let doc = DocumentReader::new(Cursor::new(mixed_document()), DecoderConfig::default())
        .read()
        .unwrap();
    doc.force_all().unwrap();
    let images: Vec<String> = doc
        .regions
        .iter()
        .filter(|region| matches!(region, Region::Image(_)))
        .map(|region| region.describe().unwrap())
        .collect();
    assert_snapshot!(images.join("\n"), @r#"
    IMAGE   4x2 rgb8 "tiny" (46 bytes, loaded)
    IMAGE   100x50 gray8 "wide" (5023 bytes, loaded)
    "#);
}
