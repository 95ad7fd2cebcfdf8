#![no_main]
use libfuzzer_sys::fuzz_target;
use oxilz::Format;
use oxilz::compress::decoder;
use oxilz::compress::encoder::{self, CompressOptions};
use oxilz::lz77::matcher::MatchStrategy;

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let format = if data[0] & 1 == 0 {
        Format::EscapedFixedWidth
    } else {
        Format::VlqTagged
    };
    let window_size = u16::from_le_bytes([data[1], data[2]]) as usize % 0x2001;
    let source = &data[3..];

    let hashed = encoder::compress(
        source,
        &CompressOptions {
            format,
            window_size,
            strategy: MatchStrategy::HashChain,
        },
    )
    .unwrap();
    let brute = encoder::compress(
        source,
        &CompressOptions {
            format,
            window_size,
            strategy: MatchStrategy::BruteForce,
        },
    )
    .unwrap();
    assert_eq!(hashed, brute);

    // Bounded encode into an exact-size buffer writes the same bytes.
    let mut dest = vec![0u8; hashed.len()];
    let n = encoder::compress_into(
        source,
        &mut dest,
        &CompressOptions {
            format,
            window_size,
            strategy: MatchStrategy::HashChain,
        },
    )
    .unwrap();
    assert_eq!(&dest[..n], &hashed[..]);

    assert_eq!(decoder::decompress(&hashed, format).unwrap(), source);
});
