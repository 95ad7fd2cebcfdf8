// Format A: escaped fixed-width tokens.
//
// Literal:        the byte itself; 0xFF is doubled (0xFF 0xFF).
// Match (4 bytes): 0xFF, then `offset - 1` in 14 bits and `length` in 10 bits:
//
//   byte1 = o >> 6
//   byte2 = (o & 0x3F) << 2 | length >> 8
//   byte3 = length & 0xFF
//
// With offsets up to MAX_WINDOW_SIZE, byte1 is at most 0x7F, so a match can
// never be confused with an escaped 0xFF literal.

use super::tokens::TokenError;
use super::{Format, MAX_MATCH_LEN, MAX_WINDOW_SIZE, Match, Token, TokenBytes, WireFormat};

/// Marker byte introducing a match or an escaped 0xFF literal.
pub const ESCAPE: u8 = 0xFF;

/// Size of a match token.
pub const MATCH_TOKEN_LEN: usize = 4;

/// Format A strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapedFixedWidth;

impl WireFormat for EscapedFixedWidth {
    const FORMAT: Format = Format::EscapedFixedWidth;

    #[inline]
    fn encode_token(token: Token, out: &mut TokenBytes) {
        match token {
            Token::Literal(byte) => {
                if byte == ESCAPE {
                    out.push(ESCAPE);
                }
                out.push(byte);
            }
            Token::Match(Match { offset, length }) => {
                debug_assert!((1..=MAX_WINDOW_SIZE).contains(&offset));
                debug_assert!(length <= MAX_MATCH_LEN);
                let o = offset - 1;
                out.extend_from_slice(&[
                    ESCAPE,
                    (o >> 6) as u8,
                    ((o & 0x3F) << 2 | length >> 8) as u8,
                    (length & 0xFF) as u8,
                ]);
            }
        }
    }

    #[inline]
    fn decode_token(input: &[u8], pos: usize) -> Result<(Token, usize), TokenError> {
        let byte = input[pos];
        if byte != ESCAPE {
            return Ok((Token::Literal(byte), 1));
        }
        if input.get(pos + 1) == Some(&ESCAPE) {
            return Ok((Token::Literal(ESCAPE), 2));
        }
        let Some(&[b1, b2, b3]) = input.get(pos + 1..pos + MATCH_TOKEN_LEN) else {
            return Err(TokenError::Truncated { position: pos });
        };
        let o = usize::from(b1) << 6 | usize::from(b2 >> 2);
        let length = usize::from(b2 & 0x03) << 8 | usize::from(b3);
        Ok((
            Token::Match(Match {
                offset: o + 1,
                length,
            }),
            MATCH_TOKEN_LEN,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
