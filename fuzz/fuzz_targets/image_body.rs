#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: IMAGE body and header decoding.
//
// Catches bugs in:
// - Header-first enforcement
// - Pixel format and dimension validation
// - expected_len overflow for huge dimensions
fuzz_target!(|data: &[u8]| {
    if let Ok(body) = drf_types::image::ImageBody::decode(data) {
        let _ = body.header.expected_len();
    }
    let _ = drf_types::image::ImageHeader::decode(data);
});
