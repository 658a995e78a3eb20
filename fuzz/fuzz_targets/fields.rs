#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use drf_types::fields::{FieldReader, read_bytes_value, read_field_header};

// Fuzz target: TLV field parsing.
//
// Walks the input with FieldReader, then reads the leading field again
// straight off a stream the way the lazy IMAGE skip does.
//
// Catches bugs in:
// - Malformed field tags
// - Wire type confusion
// - Length prefix overflows
// - Truncated field values
fuzz_target!(|data: &[u8]| {
    let mut reader = FieldReader::new(data);
    while let Ok(Some(field)) = reader.next_field() {
        let _ = field.varint();
        assert!(reader.position() <= data.len());
    }

    let mut cursor = Cursor::new(data);
    if read_field_header(&mut cursor).is_ok() {
        let _ = read_bytes_value(&mut cursor, data.len());
    }
});
