#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;

// Fuzz target: region frame parsing, from a slice and from a stream.
//
// Catches bugs in:
// - Varint overflow in region_type/content_len
// - Truncated frames
// - Oversized body lengths
// - Slice and stream readers disagreeing on the header
fuzz_target!(|data: &[u8]| {
    let from_slice = drf_wire::region_frame::RegionFrame::read_from(data);
    let from_stream =
        drf_wire::region_frame::RegionFrameHeader::read_from_stream(&mut Cursor::new(data));

    if let (Ok(Some((frame, _))), Ok(Some((header, _)))) = (&from_slice, &from_stream) {
        assert_eq!(frame.region_type, header.region_type);
        assert_eq!(frame.flags, header.flags);
        assert_eq!(frame.body.len() as u64, header.content_len);
    }
});
