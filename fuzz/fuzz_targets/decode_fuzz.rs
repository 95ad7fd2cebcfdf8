#![no_main]
use libfuzzer_sys::fuzz_target;
use oxilz::Format;
use oxilz::compress::decoder::{self, Decoder};

const OUTPUT_LIMIT: usize = 1 << 20;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode to a value or an error, never a panic.
    for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
        let unbounded = Decoder::with_output_limit(format, OUTPUT_LIMIT).decompress(data);

        // Bounded decode must agree with the unbounded form when both succeed.
        let mut dest = vec![0u8; data.len() * 2];
        let bounded = decoder::decompress_into(data, &mut dest, format);
        if let (Ok(out), Ok(n)) = (&unbounded, &bounded) {
            assert_eq!(&dest[..*n], &out[..]);
        }
    }
});
