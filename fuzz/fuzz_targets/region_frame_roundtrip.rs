#![no_main]

use libfuzzer_sys::fuzz_target;
use drf_wire::region_frame::{RegionFlags, RegionFrame, region_type};

// Fuzz target: RegionFrame write->read roundtrip.
//
// Input format:
//   byte 0: region_type
//   byte 1: flags
//   bytes 2..: body
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let rt = data[0];
    if rt == region_type::END {
        return;
    }

    let frame = RegionFrame {
        region_type: rt,
        flags: RegionFlags::from_raw(data[1]),
        body: data[2..].to_vec(),
    };

    let mut wire = Vec::new();
    frame.write_to(&mut wire).unwrap();

    let (parsed, consumed) = RegionFrame::read_from(&wire).unwrap().unwrap();
    assert_eq!(parsed, frame);
    assert_eq!(consumed, wire.len());
});
