// Whole-buffer LZ77 decoder.
//
// Tokens are parsed by `TokenIter` (which rejects truncated tokens and
// back-references before the start of the output) and replayed into a sink:
// literals are copied, matches are expanded byte by byte from the output
// already produced.

use log::debug;

use crate::lz77::sink::{Exhausted, SliceSink, Sink, VecSink};
use crate::lz77::{
    EscapedFixedWidth, Format, Token, TokenError, TokenIter, TokenStats, VlqTagged, WireFormat,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecompressError {
    /// The destination slice or the output limit is too small for the decoded
    /// output.
    #[error("destination exhausted after {written} of {capacity} bytes")]
    DestinationExhausted { written: usize, capacity: usize },
    /// The encoded input is truncated or corrupt.
    #[error("malformed input: {0}")]
    Malformed(#[from] TokenError),
}

impl From<Exhausted> for DecompressError {
    fn from(e: Exhausted) -> Self {
        Self::DestinationExhausted {
            written: e.written,
            capacity: e.capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Reusable decoder for one wire format, keeping the statistics of the last
/// call.
#[derive(Debug, Clone)]
pub struct Decoder {
    format: Format,
    output_limit: usize,
    stats: TokenStats,
    bytes_in: u64,
    bytes_out: u64,
}

impl Decoder {
    pub fn new(format: Format) -> Self {
        Self::with_output_limit(format, usize::MAX)
    }

    /// A decoder whose `decompress` refuses to produce more than `limit`
    /// bytes, failing with `DestinationExhausted` instead. Guards against
    /// small inputs that expand to huge outputs.
    pub fn with_output_limit(format: Format, limit: usize) -> Self {
        Self {
            format,
            output_limit: limit,
            stats: TokenStats::default(),
            bytes_in: 0,
            bytes_out: 0,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Token counts of the last call.
    pub fn stats(&self) -> TokenStats {
        self.stats
    }

    /// Encoded bytes consumed by the last call.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Decoded bytes written by the last call.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Decode `input` into a new vector.
    pub fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>, DecompressError> {
        let mut sink = VecSink::with_limit(input.len(), self.output_limit);
        self.run(input, &mut sink)?;
        Ok(sink.into_inner())
    }

    /// Decode `input` into `destination`, returning the bytes written.
    pub fn decompress_into(
        &mut self,
        input: &[u8],
        destination: &mut [u8],
    ) -> Result<usize, DecompressError> {
        let mut sink = SliceSink::new(destination);
        self.run(input, &mut sink)?;
        Ok(sink.len())
    }

    fn run<S: Sink>(&mut self, input: &[u8], sink: &mut S) -> Result<(), DecompressError> {
        self.stats = TokenStats::default();
        let result = match self.format {
            Format::EscapedFixedWidth => {
                decode_tokens::<EscapedFixedWidth, S>(input, sink, &mut self.stats)
            }
            Format::VlqTagged => decode_tokens::<VlqTagged, S>(input, sink, &mut self.stats),
        };
        self.bytes_out = sink.len() as u64;
        match result {
            Ok(consumed) => {
                self.bytes_in = consumed as u64;
                debug!(
                    "decompress: {} -> {} bytes, format {} ({} literals, {} matches)",
                    input.len(),
                    sink.len(),
                    self.format,
                    self.stats.literals,
                    self.stats.matches,
                );
                Ok(())
            }
            Err((consumed, e)) => {
                self.bytes_in = consumed as u64;
                debug!("decompress: failed at input offset {consumed}: {e}");
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Decode loop
// ---------------------------------------------------------------------------

/// Replay every token of `input` into `sink`. Returns the encoded bytes
/// consumed, or the offset of the failing token with the error.
fn decode_tokens<F: WireFormat, S: Sink>(
    input: &[u8],
    sink: &mut S,
    stats: &mut TokenStats,
) -> Result<usize, (usize, DecompressError)> {
    let mut iter = TokenIter::<F>::new(input);
    while let Some(record) = iter.next() {
        let record = record.map_err(|e| (iter.consumed(), DecompressError::from(e)))?;
        let written = match record.token {
            Token::Literal(byte) => sink.write_all(&[byte]),
            Token::Match(m) => sink.copy_back(m.offset, m.length),
        };
        written.map_err(|e| (record.input_pos, DecompressError::from(e)))?;
        stats.record(record.token);
    }
    Ok(iter.consumed())
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Decode `input` (encoded with `format`) into a new vector.
pub fn decompress(input: &[u8], format: Format) -> Result<Vec<u8>, DecompressError> {
    Decoder::new(format).decompress(input)
}

/// Decode `input` into `destination`, returning the number of bytes written.
///
/// On error the contents of `destination` are unspecified.
pub fn decompress_into(
    input: &[u8],
    destination: &mut [u8],
    format: Format,
) -> Result<usize, DecompressError> {
    Decoder::new(format).decompress_into(input, destination)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::encoder::{CompressOptions, compress};
    use crate::lz77::{MAX_MATCH_LEN, MAX_WINDOW_SIZE};

    const FORMATS: [Format; 2] = [Format::EscapedFixedWidth, Format::VlqTagged];

    fn roundtrip(data: &[u8], opts: &CompressOptions) -> Vec<u8> {
        let encoded = compress(data, opts).unwrap();
        let decoded = decompress(&encoded, opts.format).unwrap();
        assert_eq!(decoded, data, "roundtrip mismatch ({:?})", opts);
        encoded
    }

    #[test]
    fn empty_input() {
        for format in FORMATS {
            assert!(decompress(b"", format).unwrap().is_empty());
            let mut dest = [0u8; 4];
            assert_eq!(decompress_into(b"", &mut dest, format), Ok(0));
        }
    }

    #[test]
    fn decode_self_overlapping_match() {
        assert_eq!(
            decompress(&[b'a', 0xFF, 0x00, 0x00, 0x09], Format::EscapedFixedWidth).unwrap(),
            b"aaaaaaaaaa"
        );
        assert_eq!(
            decompress(&[b'a', 0x00, 0x81, 0x00, 0x89, 0x00], Format::VlqTagged).unwrap(),
            b"aaaaaaaaaa"
        );
    }

    #[test]
    fn short_and_literal_only_inputs() {
        for format in FORMATS {
            let opts = CompressOptions::for_format(format);
            roundtrip(b"a", &opts);
            roundtrip(b"abcd", &opts);
            let encoded = roundtrip(b"abcdefghijklmnop", &opts);
            assert!(encoded.len() >= 16);
        }
    }

    #[test]
    fn all_byte_values() {
        let data: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).chain(0..=255u8).collect();
        for format in FORMATS {
            roundtrip(&data, &CompressOptions::for_format(format));
        }
    }

    #[test]
    fn format_a_limits_roundtrip() {
        // A 1023+ byte block repeated exactly MAX_WINDOW_SIZE bytes later.
        let mut state = 7u64;
        let block: Vec<u8> = (0..MAX_WINDOW_SIZE)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                (state >> 33) as u8
            })
            .collect();
        let mut data = block.clone();
        data.extend_from_slice(&block[..MAX_MATCH_LEN + 100]);

        let opts = CompressOptions {
            window_size: MAX_WINDOW_SIZE,
            ..Default::default()
        };
        let encoded = roundtrip(&data, &opts);
        let first_match = TokenIter::<EscapedFixedWidth>::new(&encoded)
            .map(|r| r.unwrap().token)
            .find_map(|t| match t {
                Token::Match(m) => Some(m),
                Token::Literal(_) => None,
            })
            .unwrap();
        assert_eq!(first_match.offset, MAX_WINDOW_SIZE);
        assert_eq!(first_match.length, MAX_MATCH_LEN);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let encoded = compress(b"aaaaaaaaaa", &CompressOptions::default()).unwrap();
        for cut in 2..encoded.len() {
            let err = decompress(&encoded[..cut], Format::EscapedFixedWidth).unwrap_err();
            assert_eq!(
                err,
                DecompressError::Malformed(TokenError::Truncated { position: 1 })
            );
        }
    }

    #[test]
    fn back_reference_before_start_is_rejected() {
        let err = decompress(&[0xFF, 0x00, 0x04, 0x06], Format::EscapedFixedWidth).unwrap_err();
        assert!(matches!(
            err,
            DecompressError::Malformed(TokenError::InvalidBackReference { produced: 0, .. })
        ));
    }

    #[test]
    fn bounded_decode() {
        let data = b"hello hello hello hello \xFF\xFF world";
        for format in FORMATS {
            let encoded = compress(data, &CompressOptions::for_format(format)).unwrap();

            let mut exact = vec![0u8; data.len()];
            assert_eq!(decompress_into(&encoded, &mut exact, format), Ok(data.len()));
            assert_eq!(&exact[..], &data[..]);

            let mut short = vec![0u8; data.len() - 1];
            assert!(matches!(
                decompress_into(&encoded, &mut short, format),
                Err(DecompressError::DestinationExhausted { .. })
            ));
        }
    }

    #[test]
    fn match_longer_than_destination() {
        let mut dest = [0u8; 5];
        let err = decompress_into(
            &[b'a', 0xFF, 0x00, 0x00, 0x09],
            &mut dest,
            Format::EscapedFixedWidth,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DecompressError::DestinationExhausted {
                written: 1,
                capacity: 5
            }
        );
    }

    #[test]
    fn output_limit_stops_expansion() {
        // One literal, then a match of length 2^40 expressed in a few bytes.
        let mut input = vec![b'a', 0x00, 0x81, 0x00];
        crate::lz77::varint::push_vlq(&mut input, 1 << 40);
        let mut dec = Decoder::with_output_limit(Format::VlqTagged, 1 << 20);
        assert_eq!(
            dec.decompress(&input),
            Err(DecompressError::DestinationExhausted {
                written: 1,
                capacity: 1 << 20
            })
        );

        let mut dec = Decoder::with_output_limit(Format::EscapedFixedWidth, 10);
        assert_eq!(
            dec.decompress(&[b'a', 0xFF, 0x00, 0x00, 0x09]).unwrap(),
            b"aaaaaaaaaa"
        );
        assert!(dec.decompress(&[b'a', 0xFF, 0x00, 0x00, 0x0A]).is_err());
    }

    #[test]
    fn unbounded_decoder_refuses_impossible_length() {
        let mut input = vec![b'a', 0x00, 0x81, 0x00];
        crate::lz77::varint::push_vlq(&mut input, usize::MAX);
        assert!(matches!(
            decompress(&input, Format::VlqTagged),
            Err(DecompressError::DestinationExhausted { written: 1, .. })
        ));
    }

    #[test]
    fn decoder_tracks_stats() {
        let encoded = compress(b"abcdeabcdeabcde", &CompressOptions::default()).unwrap();
        let mut dec = Decoder::new(Format::EscapedFixedWidth);
        let out = dec.decompress(&encoded).unwrap();
        assert_eq!(out, b"abcdeabcdeabcde");
        assert_eq!(dec.bytes_in(), encoded.len() as u64);
        assert_eq!(dec.bytes_out(), 15);
        assert_eq!(dec.stats().literals, 5);
        assert_eq!(dec.stats().matches, 1);
    }
}
