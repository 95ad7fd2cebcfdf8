// Whole-buffer LZ77 encoder.
//
// One greedy loop, generic over the wire format and the output sink:
//   - at each cursor, ask the MatchFinder for the longest match
//   - emit a match token and skip its length, or emit one literal
//   - stop when the cursor reaches the end of the source
//
// `compress` writes into a growable vector and cannot run out of space.
// `compress_into` writes into a caller slice and stops at the first token
// that does not fit; bytes already written are left in place and must be
// discarded by the caller.

use log::{debug, trace};

use crate::lz77::matcher::{MatchFinder, MatchStrategy};
use crate::lz77::sink::{Exhausted, SliceSink, Sink, VecSink};
use crate::lz77::{
    DEFAULT_WINDOW_SIZE, EscapedFixedWidth, Format, Token, TokenBytes, TokenStats, VlqTagged,
    WireFormat,
};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressOptions {
    /// Wire format of the output.
    pub format: Format,
    /// How far back (in bytes) a match may reach.
    /// Format A accepts at most `MAX_WINDOW_SIZE`.
    pub window_size: usize,
    /// Match search strategy. Does not affect the output.
    pub strategy: MatchStrategy,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            format: Format::EscapedFixedWidth,
            window_size: DEFAULT_WINDOW_SIZE,
            strategy: MatchStrategy::HashChain,
        }
    }
}

impl CompressOptions {
    /// Default options for `format`.
    pub fn for_format(format: Format) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Reject window sizes the format cannot address.
    pub fn validate(&self) -> Result<(), CompressError> {
        match self.format.max_window_size() {
            Some(max) if self.window_size > max => Err(CompressError::InvalidWindowSize {
                format: self.format,
                window_size: self.window_size,
                max,
            }),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompressError {
    /// The window is larger than the format can address.
    #[error("window size {window_size} exceeds the {format} format maximum of {max}")]
    InvalidWindowSize {
        format: Format,
        window_size: usize,
        max: usize,
    },
    /// The destination slice filled up before the source was consumed.
    #[error("destination exhausted after {written} of {capacity} bytes")]
    DestinationExhausted { written: usize, capacity: usize },
}

impl From<Exhausted> for CompressError {
    fn from(e: Exhausted) -> Self {
        Self::DestinationExhausted {
            written: e.written,
            capacity: e.capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Reusable encoder holding validated options and the statistics of the
/// last call.
///
/// # Example
/// ```
/// use oxilz::compress::encoder::{CompressOptions, Encoder};
/// let mut enc = Encoder::new(CompressOptions::default()).unwrap();
/// let packed = enc.compress(b"abcabcabcabcabcabc").unwrap();
/// assert!(packed.len() < 18);
/// assert_eq!(enc.stats().matches, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Encoder {
    opts: CompressOptions,
    stats: TokenStats,
    bytes_in: u64,
    bytes_out: u64,
}

impl Encoder {
    /// Create an encoder. Fails if the window is too large for the format.
    pub fn new(opts: CompressOptions) -> Result<Self, CompressError> {
        opts.validate()?;
        Ok(Self {
            opts,
            stats: TokenStats::default(),
            bytes_in: 0,
            bytes_out: 0,
        })
    }

    pub fn options(&self) -> &CompressOptions {
        &self.opts
    }

    /// Token counts of the last call.
    pub fn stats(&self) -> TokenStats {
        self.stats
    }

    /// Source bytes consumed by the last call.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Encoded bytes written by the last call.
    pub fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    /// Compress `source` into a new vector.
    ///
    /// Fails only if the output vector cannot be allocated.
    pub fn compress(&mut self, source: &[u8]) -> Result<Vec<u8>, CompressError> {
        let mut sink = VecSink::with_capacity(source.len());
        self.run(source, &mut sink)?;
        let mut out = sink.into_inner();
        out.shrink_to_fit();
        Ok(out)
    }

    /// Compress `source` into `destination`, returning the bytes written.
    pub fn compress_into(
        &mut self,
        source: &[u8],
        destination: &mut [u8],
    ) -> Result<usize, CompressError> {
        let mut sink = SliceSink::new(destination);
        self.run(source, &mut sink)?;
        Ok(sink.len())
    }

    fn run<S: Sink>(&mut self, source: &[u8], sink: &mut S) -> Result<(), Exhausted> {
        self.stats = TokenStats::default();
        self.bytes_in = 0;
        let mut finder = MatchFinder::new(
            self.opts.window_size,
            self.opts.format.max_match_len(),
            self.opts.strategy,
            source.len(),
        );

        let result = match self.opts.format {
            Format::EscapedFixedWidth => {
                encode_tokens::<EscapedFixedWidth, S>(source, sink, &mut finder, &mut self.stats)
            }
            Format::VlqTagged => {
                encode_tokens::<VlqTagged, S>(source, sink, &mut finder, &mut self.stats)
            }
        };

        self.bytes_out = sink.len() as u64;
        match result {
            Ok(()) => {
                self.bytes_in = source.len() as u64;
                debug!(
                    "compress: {} -> {} bytes, format {}, window {}, {} ({} literals, {} matches)",
                    source.len(),
                    sink.len(),
                    self.opts.format,
                    self.opts.window_size,
                    finder.strategy().name(),
                    self.stats.literals,
                    self.stats.matches,
                );
                Ok(())
            }
            Err((consumed, e)) => {
                self.bytes_in = consumed as u64;
                debug!(
                    "compress: destination exhausted at {} of {} bytes (source offset {consumed})",
                    e.written, e.capacity
                );
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Encode loop
// ---------------------------------------------------------------------------

/// Greedy parse of `source` into `sink`. On exhaustion returns the source
/// offset reached alongside the error.
fn encode_tokens<F: WireFormat, S: Sink>(
    source: &[u8],
    sink: &mut S,
    finder: &mut MatchFinder,
    stats: &mut TokenStats,
) -> Result<(), (usize, Exhausted)> {
    let mut cursor = 0usize;
    let mut bytes = TokenBytes::new();

    while cursor < source.len() {
        let (token, advance) = match finder.find(source, cursor) {
            Some(m) => {
                trace!("match at {cursor}: offset {}, length {}", m.offset, m.length);
                (Token::Match(m), m.length)
            }
            None => (Token::Literal(source[cursor]), 1),
        };

        bytes.clear();
        F::encode_token(token, &mut bytes);
        sink.write_all(bytes.as_slice()).map_err(|e| (cursor, e))?;
        stats.record(token);
        cursor += advance;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Compress `source` into a new vector.
pub fn compress(source: &[u8], opts: &CompressOptions) -> Result<Vec<u8>, CompressError> {
    Encoder::new(opts.clone())?.compress(source)
}

/// Compress `source` into `destination`, returning the number of bytes written.
///
/// On `DestinationExhausted` the contents of `destination` are unspecified.
pub fn compress_into(
    source: &[u8],
    destination: &mut [u8],
    opts: &CompressOptions,
) -> Result<usize, CompressError> {
    let mut enc = Encoder::new(opts.clone())?;
    enc.compress_into(source, destination)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lz77::{MAX_WINDOW_SIZE, Match, TokenIter};

    fn tokens<F: WireFormat>(encoded: &[u8]) -> Vec<Token> {
        TokenIter::<F>::new(encoded)
            .map(|r| r.unwrap().token)
            .collect()
    }

    #[test]
    fn empty_source() {
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let out = compress(b"", &CompressOptions::for_format(format)).unwrap();
            assert!(out.is_empty());
            let mut dest = [0u8; 0];
            assert_eq!(
                compress_into(b"", &mut dest, &CompressOptions::for_format(format)),
                Ok(0)
            );
        }
    }

    #[test]
    fn run_becomes_literal_then_self_overlapping_match() {
        let out = compress(b"aaaaaaaaaa", &CompressOptions::default()).unwrap();
        assert_eq!(out, vec![b'a', 0xFF, 0x00, 0x00, 0x09]);
        assert_eq!(
            tokens::<EscapedFixedWidth>(&out),
            vec![
                Token::Literal(b'a'),
                Token::Match(Match {
                    offset: 1,
                    length: 9
                })
            ]
        );

        let out = compress(b"aaaaaaaaaa", &CompressOptions::for_format(Format::VlqTagged)).unwrap();
        assert_eq!(out, vec![b'a', 0x00, 0x81, 0x00, 0x89, 0x00]);
    }

    #[test]
    fn escape_bytes_are_doubled() {
        let out = compress(&[0xFF, 1, 0xFF], &CompressOptions::default()).unwrap();
        assert_eq!(out, vec![0xFF, 0xFF, 1, 0xFF, 0xFF]);

        let out = compress(&[0x00, 1, 0x00], &CompressOptions::for_format(Format::VlqTagged))
            .unwrap();
        assert_eq!(out, vec![0x00, 0x00, 1, 0x00, 0x00]);
    }

    #[test]
    fn window_size_validation() {
        let ok = CompressOptions {
            window_size: MAX_WINDOW_SIZE,
            ..Default::default()
        };
        assert!(Encoder::new(ok).is_ok());

        let too_big = CompressOptions {
            window_size: MAX_WINDOW_SIZE + 1,
            ..Default::default()
        };
        assert_eq!(
            Encoder::new(too_big).unwrap_err(),
            CompressError::InvalidWindowSize {
                format: Format::EscapedFixedWidth,
                window_size: MAX_WINDOW_SIZE + 1,
                max: MAX_WINDOW_SIZE,
            }
        );

        let vlq_big = CompressOptions {
            format: Format::VlqTagged,
            window_size: 1 << 20,
            ..Default::default()
        };
        assert!(Encoder::new(vlq_big).is_ok());
    }

    #[test]
    fn bounded_matches_unbounded() {
        let data: Vec<u8> = b"the quick brown fox, the quick brown dog; \xFF\xFF the end"
            .iter()
            .copied()
            .cycle()
            .take(2000)
            .collect();
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let opts = CompressOptions::for_format(format);
            let expected = compress(&data, &opts).unwrap();
            let mut dest = vec![0u8; expected.len()];
            let n = compress_into(&data, &mut dest, &opts).unwrap();
            assert_eq!(n, expected.len());
            assert_eq!(dest, expected);
        }
    }

    #[test]
    fn destination_one_byte_short() {
        let data = b"abcdefabcdefabcdef\xFF";
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let opts = CompressOptions::for_format(format);
            let expected = compress(data, &opts).unwrap();
            let mut dest = vec![0u8; expected.len() - 1];
            let err = compress_into(data, &mut dest, &opts).unwrap_err();
            assert!(matches!(err, CompressError::DestinationExhausted { .. }));
        }
    }

    #[test]
    fn escaped_literal_needs_both_bytes() {
        let mut dest = [0u8; 1];
        let err = compress_into(&[0xFF], &mut dest, &CompressOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CompressError::DestinationExhausted {
                written: 0,
                capacity: 1
            }
        );
    }

    #[test]
    fn encoder_tracks_stats() {
        let mut enc = Encoder::new(CompressOptions::default()).unwrap();
        let out = enc.compress(b"abcdeabcdeabcde").unwrap();
        assert_eq!(enc.bytes_in(), 15);
        assert_eq!(enc.bytes_out(), out.len() as u64);
        assert_eq!(enc.stats().literals, 5);
        assert_eq!(enc.stats().matches, 1);
        assert_eq!(enc.stats().matched_bytes, 10);
    }

    #[test]
    fn strategies_produce_identical_output() {
        let data: Vec<u8> = (0..5000u32).map(|i| ((i * 7) % 13 + (i / 97) % 5) as u8).collect();
        for format in [Format::EscapedFixedWidth, Format::VlqTagged] {
            let brute = compress(
                &data,
                &CompressOptions {
                    format,
                    strategy: MatchStrategy::BruteForce,
                    ..Default::default()
                },
            )
            .unwrap();
            let chained = compress(
                &data,
                &CompressOptions {
                    format,
                    strategy: MatchStrategy::HashChain,
                    ..Default::default()
                },
            )
            .unwrap();
            assert_eq!(brute, chained);
        }
    }
}
