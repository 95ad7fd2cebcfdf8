use oxilz::Format;
use oxilz::compress::encoder::CompressOptions;
use oxilz::io::{compress_file, decompress_file, roundtrip_file};
use std::io::Write;
use tempfile::NamedTempFile;

/// Text-like content: numbered lines with a lot of shared structure.
fn write_log_lines(file: &mut NamedTempFile, lines: usize) -> u64 {
    let mut written = 0u64;
    for i in 0..lines {
        let line = format!(
            "2026-01-{:02} 12:{:02}:{:02} INFO worker-{} processed request id={} status=200\n",
            i % 28 + 1,
            i % 60,
            (i * 7) % 60,
            i % 8,
            i * 31
        );
        file.write_all(line.as_bytes()).unwrap();
        written += line.len() as u64;
    }
    file.flush().unwrap();
    written
}

#[test]
#[ignore = "multi-MB test is opt-in due to runtime in debug builds"]
fn large_log_file_roundtrip() {
    let mut input = NamedTempFile::new().unwrap();
    let size = write_log_lines(&mut input, 400_000);

    for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
        let opts = CompressOptions {
            format,
            window_size: 8192,
            ..Default::default()
        };
        let stats = roundtrip_file(input.path(), &opts).unwrap();
        assert_eq!(stats.input_size, size);
        assert!(stats.ratio() < 0.5, "format={format} ratio={}", stats.ratio());
        assert_eq!(stats.input_sha256, stats.output_sha256);
    }
}

#[test]
fn file_helpers_roundtrip() {
    let mut input = NamedTempFile::new().unwrap();
    let size = write_log_lines(&mut input, 2_000);
    let packed = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();

    for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
        let c = compress_file(input.path(), packed.path(), &CompressOptions::for_format(format))
            .unwrap();
        assert_eq!(c.input_size, size);
        assert_eq!(c.output_size, std::fs::metadata(packed.path()).unwrap().len());
        assert!(c.output_size < size / 2);

        let d = decompress_file(packed.path(), output.path(), format).unwrap();
        assert_eq!(d.output_size, size);
        assert_eq!(d.tokens, c.tokens);
        assert_eq!(
            std::fs::read(output.path()).unwrap(),
            std::fs::read(input.path()).unwrap()
        );
        assert_eq!(c.input_sha256, d.output_sha256);
    }
}

#[test]
fn edge_case_matrix() {
    let cases: Vec<&[u8]> = vec![
        b"",
        b"x",
        b"\0\0\0\0\0",
        b"\xFF\xFF\xFF\xFF\xFF\xFF",
        b"\0\0\0\0\0\0\x01",
    ];

    for source in cases {
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let opts = CompressOptions::for_format(format);
            let encoded = oxilz::compress::compress(source, &opts).unwrap();
            let decoded = oxilz::compress::decompress(&encoded, format).unwrap();
            assert_eq!(decoded, source);
        }
    }
}
