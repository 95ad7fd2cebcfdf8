// Token iteration over an encoded buffer.
//
// `TokenIter` parses tokens one at a time and tracks how many output bytes
// they would produce, rejecting back-references that reach before the start
// of the output. The decoder replays these tokens into a sink; the CLI uses
// the same iterator to print a token listing.

use std::marker::PhantomData;

use super::{Token, WireFormat};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Malformed encoded input. `position` is the offset of the offending token
/// in the encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("truncated token at input offset {position}")]
    Truncated { position: usize },
    #[error("length field overflows at input offset {position}")]
    Overflow { position: usize },
    #[error("invalid byte {byte:#04x} after tag at input offset {position}")]
    InvalidTag { position: usize, byte: u8 },
    #[error(
        "back-reference at input offset {position} reaches {offset} bytes back, \
         but only {produced} bytes were produced"
    )]
    InvalidBackReference {
        position: usize,
        offset: usize,
        produced: usize,
    },
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One parsed token with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRecord {
    pub token: Token,
    /// Offset of the token in the encoded buffer.
    pub input_pos: usize,
    /// Encoded size of the token.
    pub encoded_len: usize,
    /// Output position the token's bytes start at.
    pub output_pos: usize,
}

/// Token counts for one encode or decode call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenStats {
    pub literals: u64,
    pub matches: u64,
    /// Output bytes produced by matches.
    pub matched_bytes: u64,
}

impl TokenStats {
    #[inline]
    pub fn record(&mut self, token: Token) {
        match token {
            Token::Literal(_) => self.literals += 1,
            Token::Match(m) => {
                self.matches += 1;
                self.matched_bytes += m.length as u64;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Iterator
// ---------------------------------------------------------------------------

/// Iterate over the tokens of a buffer encoded with format `F`.
///
/// Yields `Err` once for the first malformed token and then stops.
pub struct TokenIter<'a, F: WireFormat> {
    input: &'a [u8],
    pos: usize,
    produced: usize,
    failed: bool,
    _format: PhantomData<F>,
}

impl<'a, F: WireFormat> TokenIter<'a, F> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            produced: 0,
            failed: false,
            _format: PhantomData,
        }
    }

    /// Output bytes represented by the tokens yielded so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Encoded bytes consumed so far.
    pub fn consumed(&self) -> usize {
        self.pos
    }

    fn next_record(&mut self) -> Result<TokenRecord, TokenError> {
        let (token, encoded_len) = F::decode_token(self.input, self.pos)?;
        if let Token::Match(m) = token
            && (m.offset == 0 || m.offset > self.produced)
        {
            return Err(TokenError::InvalidBackReference {
                position: self.pos,
                offset: m.offset,
                produced: self.produced,
            });
        }
        let record = TokenRecord {
            token,
            input_pos: self.pos,
            encoded_len,
            output_pos: self.produced,
        };
        self.pos += encoded_len;
        self.produced = self.produced.saturating_add(token.output_len());
        Ok(record)
    }
}

impl<F: WireFormat> Iterator for TokenIter<'_, F> {
    type Item = Result<TokenRecord, TokenError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.input.len() {
            return None;
        }
        let item = self.next_record();
        self.failed = item.is_err();
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
