// LZ77 sliding-window core.
//
// Both wire formats share the same token model and the same match policy;
// only the byte layout of a token differs. This module provides:
//
// - `sink`: bounded (`&mut [u8]`) and growable (`Vec<u8>`) output buffers
// - `matcher`: longest backward match search (brute force or hash chain)
// - `varint`: the format-B variable-length quantity
// - `escaped`: format A: 0xFF escape marker, fixed 4-byte match token
// - `tagged`: format B: 0x00 tag, VLQ offset and length
// - `tokens`: token iterator used by the decoder and for inspection

pub mod escaped;
pub mod matcher;
pub mod sink;
pub mod tagged;
pub mod tokens;
pub mod varint;

pub use escaped::EscapedFixedWidth;
pub use matcher::{MatchFinder, MatchStrategy};
pub use sink::{Exhausted, SliceSink, Sink, VecSink};
pub use tagged::VlqTagged;
pub use tokens::{TokenError, TokenIter, TokenRecord, TokenStats};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Window size used when the caller does not pick one.
pub const DEFAULT_WINDOW_SIZE: usize = 1000;

/// Largest window format A can address. `offset - 1` stays below 0x2000, so
/// the first byte after the escape is at most 0x7F.
pub const MAX_WINDOW_SIZE: usize = 0x2000;

/// Shortest match worth a back-reference. Anything shorter is emitted as literals.
pub const MIN_MATCH_LEN: usize = 5;

/// Longest match format A can express (10 bits of length).
pub const MAX_MATCH_LEN: usize = 0x3FF;

/// Upper bound on the encoded size of a single token in either format.
///
/// Format B: tag byte plus two maximal VLQs.
pub const MAX_TOKEN_LEN: usize = 1 + 2 * varint::MAX_VLQ_LEN;

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// A back-reference: copy `length` bytes starting `offset` bytes before the
/// current output position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    /// Backward distance, always >= 1.
    pub offset: usize,
    /// Number of bytes to copy. May exceed `offset` (self-overlapping copy).
    pub length: usize,
}

/// The atomic encoded unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Literal(u8),
    Match(Match),
}

impl Token {
    /// Number of output bytes this token produces.
    #[inline]
    pub fn output_len(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::Match(m) => m.length,
        }
    }
}

/// Scratch buffer holding the wire bytes of one token.
#[derive(Debug, Clone, Copy)]
pub struct TokenBytes {
    buf: [u8; MAX_TOKEN_LEN],
    len: usize,
}

impl TokenBytes {
    pub fn new() -> Self {
        Self {
            buf: [0u8; MAX_TOKEN_LEN],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf[self.len] = byte;
        self.len += 1;
    }

    #[inline]
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Default for TokenBytes {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

/// Byte layout of tokens on the wire.
///
/// The encoder and decoder loops are written once against this trait; each
/// format only describes how one token is serialized and parsed.
pub trait WireFormat {
    /// The `Format` tag this implementation corresponds to.
    const FORMAT: Format;

    /// Serialize `token` into `out`. `out` is cleared by the caller.
    ///
    /// Matches must respect the format's limits (`Format::max_window_size`,
    /// `Format::max_match_len`); the encoder guarantees this.
    fn encode_token(token: Token, out: &mut TokenBytes);

    /// Parse the token starting at `input[pos]`.
    ///
    /// Returns the token and the number of bytes it occupies. Never reads past
    /// the end of `input`; a token cut short is reported as
    /// `TokenError::Truncated`.
    fn decode_token(input: &[u8], pos: usize) -> Result<(Token, usize), TokenError>;
}

/// Selectable wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// 0xFF escape marker, fixed 4-byte match token (14-bit offset, 10-bit length).
    #[default]
    EscapedFixedWidth,
    /// 0x00 tag followed by VLQ offset and VLQ length.
    VlqTagged,
}

impl Format {
    /// Short name used by the CLI and in logs.
    pub fn name(self) -> &'static str {
        match self {
            Format::EscapedFixedWidth => "escaped",
            Format::VlqTagged => "vlq",
        }
    }

    /// Largest window the wire layout can address, if bounded.
    pub fn max_window_size(self) -> Option<usize> {
        match self {
            Format::EscapedFixedWidth => Some(MAX_WINDOW_SIZE),
            Format::VlqTagged => None,
        }
    }

    /// Longest match the wire layout can express, if bounded.
    pub fn max_match_len(self) -> Option<usize> {
        match self {
            Format::EscapedFixedWidth => Some(MAX_MATCH_LEN),
            Format::VlqTagged => None,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_limits() {
        assert_eq!(Format::EscapedFixedWidth.max_window_size(), Some(8192));
        assert_eq!(Format::EscapedFixedWidth.max_match_len(), Some(1023));
        assert_eq!(Format::VlqTagged.max_window_size(), None);
        assert_eq!(Format::VlqTagged.max_match_len(), None);
        assert_eq!(Format::default(), Format::EscapedFixedWidth);
    }

    #[test]
    fn token_bytes_push_and_clear() {
        let mut tb = TokenBytes::new();
        assert!(tb.is_empty());
        tb.push(1);
        tb.extend_from_slice(&[2, 3]);
        assert_eq!(tb.as_slice(), &[1, 2, 3]);
        tb.clear();
        assert_eq!(tb.len(), 0);
    }

    #[test]
    fn max_token_fits_two_vlqs() {
        let mut tb = TokenBytes::new();
        VlqTagged::encode_token(
            Token::Match(Match {
                offset: usize::MAX,
                length: usize::MAX,
            }),
            &mut tb,
        );
        assert!(tb.len() <= MAX_TOKEN_LEN);
    }
}
