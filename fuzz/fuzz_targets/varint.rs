#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

// Fuzz target: LEB128 varint decoding, slice and stream.
//
// Catches bugs in:
// - VarintTooLong (>10 continuation bytes)
// - Zero-length input
// - Maximum value edge cases (u64::MAX)
// - The stream reader consuming past the varint
fuzz_target!(|data: &[u8]| {
    let from_slice = drf_wire::varint::decode_varint(data);
    let mut cursor = Cursor::new(data);
    let from_stream = drf_wire::varint::read_varint(&mut cursor);
    if let (Ok(a), Ok(b)) = (&from_slice, &from_stream) {
        assert_eq!(a, b);
        assert_eq!(cursor.position() as usize, b.1);
    }
});
