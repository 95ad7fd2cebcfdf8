#![no_main]
use libfuzzer_sys::fuzz_target;
use oxilz::Format;
use oxilz::compress::{self, CompressOptions};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte selects the format; the rest is the payload, repeated to
    // give the match finder something to find.
    let format = if data[0] & 1 == 0 {
        Format::EscapedFixedWidth
    } else {
        Format::VlqTagged
    };
    let payload = &data[1..];
    let mut source = payload.to_vec();
    if data[0] & 2 != 0 {
        source.extend_from_slice(payload);
    }

    let packed = compress::compress(&source, &CompressOptions::for_format(format)).unwrap();
    let unpacked = compress::decompress(&packed, format).unwrap();
    assert_eq!(unpacked, source);
});
