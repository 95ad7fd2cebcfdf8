// Output sinks shared by the encoder and decoder loops.
//
// `SliceSink` writes into a caller-provided `&mut [u8]` and refuses any write
// that would not fit. `VecSink` grows without limit. Because both loops are
// generic over `Sink`, the two call shapes emit identical bytes.

/// A write did not fit in the remaining destination space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted {
    /// Bytes written before the failing write.
    pub written: usize,
    /// Total destination capacity.
    pub capacity: usize,
}

/// Destination for encoded or decoded bytes.
pub trait Sink {
    /// Bytes written so far.
    fn len(&self) -> usize;

    /// Whether nothing has been written.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write all of `bytes`, or nothing if they do not fit.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Exhausted>;

    /// Append `length` bytes copied from `offset` bytes back, one byte at a
    /// time, so the copy may read bytes it has just written.
    ///
    /// The caller guarantees `1 <= offset <= self.len()`. Writes nothing if
    /// `length` bytes do not fit.
    fn copy_back(&mut self, offset: usize, length: usize) -> Result<(), Exhausted>;
}

// ---------------------------------------------------------------------------
// Bounded sink
// ---------------------------------------------------------------------------

/// Sink over a fixed destination slice.
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Unused destination space.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[inline]
    fn check(&self, needed: usize) -> Result<(), Exhausted> {
        if needed > self.remaining() {
            return Err(Exhausted {
                written: self.pos,
                capacity: self.buf.len(),
            });
        }
        Ok(())
    }
}

impl Sink for SliceSink<'_> {
    #[inline]
    fn len(&self) -> usize {
        self.pos
    }

    #[inline]
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Exhausted> {
        self.check(bytes.len())?;
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn copy_back(&mut self, offset: usize, length: usize) -> Result<(), Exhausted> {
        debug_assert!(offset >= 1 && offset <= self.pos);
        self.check(length)?;
        let start = self.pos - offset;
        if offset >= length {
            self.buf.copy_within(start..start + length, self.pos);
        } else {
            for i in 0..length {
                self.buf[self.pos + i] = self.buf[start + i];
            }
        }
        self.pos += length;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Growable sink
// ---------------------------------------------------------------------------

/// Sink over an owned, growable vector, optionally capped at `limit` bytes.
///
/// Growth is fallible: a write whose size overflows or cannot be allocated is
/// reported as `Exhausted` instead of aborting.
#[derive(Debug)]
pub struct VecSink {
    buf: Vec<u8>,
    limit: usize,
}

impl Default for VecSink {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl VecSink {
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limit(capacity, usize::MAX)
    }

    /// A sink that refuses to grow past `limit` bytes.
    pub fn with_limit(capacity: usize, limit: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.min(limit)),
            limit,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn grow(&mut self, additional: usize) -> Result<(), Exhausted> {
        let exhausted = Exhausted {
            written: self.buf.len(),
            capacity: self.limit,
        };
        match self.buf.len().checked_add(additional) {
            Some(total) if total <= self.limit => {
                self.buf.try_reserve(additional).map_err(|_| exhausted)
            }
            _ => Err(exhausted),
        }
    }
}

impl Sink for VecSink {
    #[inline]
    fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Exhausted> {
        self.grow(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    fn copy_back(&mut self, offset: usize, length: usize) -> Result<(), Exhausted> {
        debug_assert!(offset >= 1 && offset <= self.buf.len());
        self.grow(length)?;
        let start = self.buf.len() - offset;
        if offset >= length {
            self.buf.extend_from_within(start..start + length);
        } else {
            for i in 0..length {
                let byte = self.buf[start + i];
                self.buf.push(byte);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
