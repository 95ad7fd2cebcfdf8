// Format-B variable-length quantity.
//
// Base-128, least-significant group first. A byte with bit 7 set means more
// groups follow; the final byte has bit 7 clear. Values that fit in a single
// group are still written as two bytes, `[0x80 | v, 0x00]`, so the first byte
// of every encoded value carries the continuation bit.

/// Maximum encoded length of a `usize` (ceil(bits / 7)).
pub const MAX_VLQ_LEN: usize = (usize::BITS as usize).div_ceil(7);

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `num` into `buf`. Returns the number of bytes written (2..=MAX_VLQ_LEN).
#[inline]
pub fn write_vlq(mut num: usize, buf: &mut [u8; MAX_VLQ_LEN]) -> usize {
    if num <= 0x7F {
        buf[0] = 0x80 | num as u8;
        buf[1] = 0x00;
        return 2;
    }
    let mut i = 0;
    loop {
        let group = (num & 0x7F) as u8;
        num >>= 7;
        if num == 0 {
            buf[i] = group;
            return i + 1;
        }
        buf[i] = group | 0x80;
        i += 1;
    }
}

/// Append the encoding of `num` to `out`.
#[cfg(test)]
pub(crate) fn push_vlq(out: &mut Vec<u8>, num: usize) {
    let mut buf = [0u8; MAX_VLQ_LEN];
    let len = write_vlq(num, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a value from the start of `data`.
/// Returns `(value, bytes_consumed)`.
///
/// Reads up to and including the first byte whose bit 7 is clear.
pub fn read_vlq(data: &[u8]) -> Result<(usize, usize), VlqError> {
    let mut val: usize = 0;
    for (i, &byte) in data.iter().enumerate() {
        let group = usize::from(byte & 0x7F);
        if i < MAX_VLQ_LEN {
            let shift = 7 * i as u32;
            // Bits shifted out of the top would be lost.
            if shift > 0 && group >> (usize::BITS - shift) != 0 {
                return Err(VlqError::Overflow);
            }
            val |= group << shift;
        } else if group != 0 {
            return Err(VlqError::Overflow);
        }
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
    }
    Err(VlqError::Truncated)
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VlqError {
    /// Input ended before the terminating byte.
    #[error("vlq truncated (no terminating byte)")]
    Truncated,
    /// Value does not fit in `usize`.
    #[error("vlq overflow")]
    Overflow,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
