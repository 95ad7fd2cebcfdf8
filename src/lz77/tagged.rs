// Format B: VLQ-tagged tokens.
//
// Every byte other than TAG is a literal, copied through unchanged.
// TAG starts a two-way choice decided by the high bit of the next byte:
//
//   TAG TAG                   literal 0x00
//   TAG VLQ(offset) VLQ(len)  match (a VLQ always starts with bit 7 set)
//
// TAG followed by any other byte (0x01..=0x7F) is malformed. Offsets are the
// literal backward distance, with no implicit `- 1`.
//
// The leading TAG on every match makes this layout incompatible with an
// untagged `VLQ(offset) VLQ(len)` stream. Such a stream cannot carry literals
// of 0x80 and above, so streams from an untagged encoder do not decode here
// and this encoder's output does not decode there.

use super::tokens::TokenError;
use super::varint::{self, MAX_VLQ_LEN, VlqError};
use super::{Format, Match, Token, TokenBytes, WireFormat};

/// Tag byte introducing a match or an escaped zero literal.
pub const TAG: u8 = 0x00;

/// Format B strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct VlqTagged;

impl WireFormat for VlqTagged {
    const FORMAT: Format = Format::VlqTagged;

    #[inline]
    fn encode_token(token: Token, out: &mut TokenBytes) {
        match token {
            Token::Literal(byte) => {
                if byte == TAG {
                    out.push(TAG);
                }
                out.push(byte);
            }
            Token::Match(Match { offset, length }) => {
                let mut buf = [0u8; MAX_VLQ_LEN];
                out.push(TAG);
                let n = varint::write_vlq(offset, &mut buf);
                out.extend_from_slice(&buf[..n]);
                let n = varint::write_vlq(length, &mut buf);
                out.extend_from_slice(&buf[..n]);
            }
        }
    }

    #[inline]
    fn decode_token(input: &[u8], pos: usize) -> Result<(Token, usize), TokenError> {
        let byte = input[pos];
        if byte != TAG {
            return Ok((Token::Literal(byte), 1));
        }
        let next = *input
            .get(pos + 1)
            .ok_or(TokenError::Truncated { position: pos })?;
        if next == TAG {
            return Ok((Token::Literal(TAG), 2));
        }
        if next & 0x80 == 0 {
            return Err(TokenError::InvalidTag {
                position: pos,
                byte: next,
            });
        }

        let vlq_err = |e: VlqError| match e {
            VlqError::Truncated => TokenError::Truncated { position: pos },
            VlqError::Overflow => TokenError::Overflow { position: pos },
        };
        let mut used = 1;
        let (offset, n) = varint::read_vlq(&input[pos + used..]).map_err(vlq_err)?;
        used += n;
        let (length, n) = varint::read_vlq(&input[pos + used..]).map_err(vlq_err)?;
        used += n;
        Ok((Token::Match(Match { offset, length }), used))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(token: Token) -> Vec<u8> {
        let mut tb = TokenBytes::new();
        VlqTagged::encode_token(token, &mut tb);
        tb.as_slice().to_vec()
    }

    #[test]
    fn literals_pass_through() {
        assert_eq!(encode(Token::Literal(b'a')), vec![b'a']);
        assert_eq!(encode(Token::Literal(0xFF)), vec![0xFF]);
        assert_eq!(encode(Token::Literal(0x80)), vec![0x80]);
        assert_eq!(encode(Token::Literal(0x00)), vec![0x00, 0x00]);
    }

    #[test]
    fn match_layout() {
        assert_eq!(
            encode(Token::Match(Match { offset: 1, length: 9 })),
            vec![0x00, 0x81, 0x00, 0x89, 0x00]
        );
        assert_eq!(
            encode(Token::Match(Match {
                offset: 300,
                length: 5
            })),
            vec![0x00, 0xAC, 0x02, 0x85, 0x00]
        );
    }

    #[test]
    fn decode_each_token_kind() {
        let data = [b'q', 0x00, 0x00, 0x00, 0xAC, 0x02, 0x85, 0x00];
        assert_eq!(VlqTagged::decode_token(&data, 0), Ok((Token::Literal(b'q'), 1)));
        assert_eq!(VlqTagged::decode_token(&data, 1), Ok((Token::Literal(0), 2)));
        assert_eq!(
            VlqTagged::decode_token(&data, 3),
            Ok((
                Token::Match(Match {
                    offset: 300,
                    length: 5
                }),
                5
            ))
        );
    }

    #[test]
    fn malformed_tokens() {
        assert_eq!(
            VlqTagged::decode_token(&[0x00], 0),
            Err(TokenError::Truncated { position: 0 })
        );
        assert_eq!(
            VlqTagged::decode_token(&[0x00, 0x81, 0x00, 0x85], 0),
            Err(TokenError::Truncated { position: 0 })
        );
        assert_eq!(
            VlqTagged::decode_token(&[0x00, 0x12], 0),
            Err(TokenError::InvalidTag {
                position: 0,
                byte: 0x12
            })
        );
        let mut overflow = vec![0x00];
        overflow.extend_from_slice(&[0xFF; MAX_VLQ_LEN]);
        overflow.push(0x01);
        assert_eq!(
            VlqTagged::decode_token(&overflow, 0),
            Err(TokenError::Overflow { position: 0 })
        );
    }
}
