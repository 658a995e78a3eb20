#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: DocumentHeader::read_from with arbitrary bytes.
//
// Catches bugs in:
// - Magic byte validation
// - Version checking
// - Reserved byte enforcement
// - Truncated header handling
fuzz_target!(|data: &[u8]| {
    if let Ok(header) = drf_wire::header::DocumentHeader::read_from(data) {
        assert_eq!(header.to_bytes()[..], data[..drf_wire::header::HEADER_SIZE]);
    }
});
