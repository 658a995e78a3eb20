#![no_main]

use std::io::Cursor;

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use drf_decoder::{DecoderConfig, DocumentReader, LazyPolicy, Region};
use drf_encoder::DocumentEncoder;
use drf_types::PixelFormat;

#[derive(Debug, Arbitrary)]
enum FuzzRegion {
    Text {
        title: String,
        content: Vec<u8>,
    },
    Image {
        format_id: u8,
        width: u8,
        height: u8,
        alt_text: String,
        seed: u8,
        compress: bool,
        digest: bool,
    },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    regions: Vec<FuzzRegion>,
    threshold: u16,
}

fn format_from_id(id: u8) -> PixelFormat {
    match id % 3 {
        0 => PixelFormat::Gray8,
        1 => PixelFormat::Rgb8,
        _ => PixelFormat::Rgba8,
    }
}

// Fuzz target: DocumentEncoder -> DocumentReader roundtrip.
//
// Everything the encoder produces must read back, and every image must
// load to exactly the pixels that went in.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };
    if input.regions.is_empty() {
        return;
    }

    let regions = &input.regions[..input.regions.len().min(32)];
    let mut encoder = DocumentEncoder::new();
    let mut expected = Vec::new();
    for region in regions {
        match region {
            FuzzRegion::Text { title, content } => {
                encoder.add_text(title, content);
                expected.push(None);
            }
            FuzzRegion::Image { format_id, width, height, alt_text, seed, compress, digest } => {
                let format = format_from_id(*format_id);
                let len = usize::from(*width) * usize::from(*height) * format.bytes_per_pixel() as usize;
                let pixels: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(*seed)).collect();
                encoder.add_image(format, u32::from(*width), u32::from(*height), alt_text, &pixels);
                if *compress {
                    encoder.with_compression();
                }
                if *digest {
                    encoder.with_digest();
                }
                expected.push(Some(pixels));
            }
        }
    }

    let Ok(payload) = encoder.encode() else {
        return;
    };

    let config = DecoderConfig {
        lazy_policy: LazyPolicy::Threshold(u64::from(input.threshold)),
        ..DecoderConfig::default()
    };
    let doc = DocumentReader::new(Cursor::new(payload), config)
        .read()
        .expect("reader failed on valid encoder output");
    assert_eq!(doc.regions.len(), expected.len());

    for (region, pixels) in doc.regions.iter().zip(&expected) {
        match (region, pixels) {
            (Region::Image(image), Some(pixels)) => {
                assert_eq!(&*image.pixels().unwrap(), &pixels[..]);
            }
            (Region::Text { .. }, None) => {}
            _ => panic!("region kind changed in roundtrip"),
        }
    }
});
