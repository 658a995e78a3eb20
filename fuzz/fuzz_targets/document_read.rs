#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use drf_decoder::{DecoderConfig, DocumentReader, LazyPolicy};

// Fuzz target: full lazy read, then load every image.
//
// Catches bugs in:
// - Header validation
// - Frame iteration and skipping
// - Lazy binding of truncated or malformed IMAGE regions
// - Deferred loads (decompression, size and digest checks)
// - Stream position restore after a failed load
fuzz_target!(|data: &[u8]| {
    let config = DecoderConfig {
        lazy_policy: LazyPolicy::Always,
        max_pixel_bytes: 1 << 20,
        ..DecoderConfig::default()
    };
    let Ok(doc) = DocumentReader::new(Cursor::new(data), config).read() else {
        return;
    };

    let end = doc.stream().current_position().unwrap();
    for region in &doc.regions {
        let _ = region.describe();
        if let Some(image) = region.as_image() {
            let _ = image.force();
            let _ = image.row(0);
        }
    }
    assert_eq!(doc.stream().current_position().unwrap(), end);
});
