// Longest backward match search.
//
// The policy is fixed: among every offset in [1, min(window_size, cursor)],
// pick the longest common prefix with the bytes at the cursor, capped at the
// remaining input and at the format's maximum match length. Ties go to the
// smallest offset. Matches shorter than MIN_MATCH_LEN are not reported.
//
// Two strategies implement that policy:
//   - `BruteForce`: scan every offset (O(window * match length) per position).
//   - `HashChain`: hash the next MIN_MATCH_LEN bytes and walk a full chain of
//     earlier positions with the same hash, newest first. Any qualifying match
//     shares those bytes, so the chain visits every candidate the brute-force
//     scan could accept, in the same (ascending offset) order.

use super::{MIN_MATCH_LEN, Match};

/// Number of hash buckets (log2).
const HASH_BITS: u32 = 15;

/// Stored chain values are `pos + HASH_CKOFFSET` so that 0 means "empty".
const HASH_CKOFFSET: u32 = 1;

/// Match search strategy. Both produce identical matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchStrategy {
    /// Scan every offset in the window.
    BruteForce,
    /// Walk a hash chain of earlier positions.
    #[default]
    HashChain,
}

impl MatchStrategy {
    pub fn name(self) -> &'static str {
        match self {
            MatchStrategy::BruteForce => "brute-force",
            MatchStrategy::HashChain => "hash-chain",
        }
    }
}

// ---------------------------------------------------------------------------
// Common prefix
// ---------------------------------------------------------------------------

/// Length of the common prefix of `a` and `b`, at most `max_len`.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8], max_len: usize) -> usize {
    a.iter()
        .zip(b)
        .take(max_len)
        .take_while(|(x, y)| x == y)
        .count()
}

/// Brute-force longest match at `cursor`.
///
/// `max_len` caps the match length in addition to the remaining input.
pub fn find_longest_match(
    source: &[u8],
    cursor: usize,
    window_size: usize,
    max_len: Option<usize>,
) -> Option<Match> {
    let cap = length_cap(source, cursor, max_len);
    if cap < MIN_MATCH_LEN {
        return None;
    }
    let target = &source[cursor..];
    let mut best: Option<Match> = None;
    for offset in 1..=window_size.min(cursor) {
        let length = common_prefix_len(&source[cursor - offset..], target, cap);
        if length >= MIN_MATCH_LEN && best.is_none_or(|b| length > b.length) {
            best = Some(Match { offset, length });
            if length == cap {
                break;
            }
        }
    }
    best
}

#[inline]
fn length_cap(source: &[u8], cursor: usize, max_len: Option<usize>) -> usize {
    let remaining = source.len().saturating_sub(cursor);
    max_len.map_or(remaining, |m| m.min(remaining))
}

#[inline]
fn hash_prefix(bytes: &[u8]) -> usize {
    let v = u64::from(bytes[0])
        | u64::from(bytes[1]) << 8
        | u64::from(bytes[2]) << 16
        | u64::from(bytes[3]) << 24
        | u64::from(bytes[4]) << 32;
    (v.wrapping_mul(0x9E37_79B1_85EB_CA87) >> (64 - HASH_BITS)) as usize
}

// ---------------------------------------------------------------------------
// Hash chain
// ---------------------------------------------------------------------------

/// Bucket heads plus one `prev` link per input position.
///
/// Positions are inserted lazily, in order, up to the current cursor, so
/// bytes skipped over by a match are still indexed. Only positions below
/// `next_insert` are ever linked.
struct HashChain {
    head: Vec<u32>,
    prev: Vec<u32>,
    next_insert: usize,
}

impl HashChain {
    fn new(source_len: usize) -> Self {
        Self {
            head: vec![0u32; 1 << HASH_BITS],
            prev: vec![0u32; source_len],
            next_insert: 0,
        }
    }

    /// Drop every indexed position and size the links for `source_len`.
    fn reset(&mut self, source_len: usize) {
        self.head.fill(0);
        self.prev.clear();
        self.prev.resize(source_len, 0);
        self.next_insert = 0;
    }

    fn insert_until(&mut self, source: &[u8], cursor: usize) {
        let last_hashable = source.len().saturating_sub(MIN_MATCH_LEN);
        while self.next_insert < cursor {
            let pos = self.next_insert;
            if pos <= last_hashable {
                let bucket = hash_prefix(&source[pos..]);
                self.prev[pos] = self.head[bucket];
                // Fits: the chain is only built when source_len < u32::MAX.
                self.head[bucket] = pos as u32 + HASH_CKOFFSET;
            }
            self.next_insert += 1;
        }
    }

    fn find(
        &mut self,
        source: &[u8],
        cursor: usize,
        window_size: usize,
        cap: usize,
    ) -> Option<Match> {
        if cursor < self.next_insert || source.len() != self.prev.len() {
            self.reset(source.len());
        }
        self.insert_until(source, cursor);
        let lowest = cursor.saturating_sub(window_size);
        let target = &source[cursor..];
        let mut best: Option<Match> = None;
        let mut link = self.head[hash_prefix(target)];
        while link != 0 {
            let pos = (link - HASH_CKOFFSET) as usize;
            if pos < lowest || pos >= cursor {
                break;
            }
            let length = common_prefix_len(&source[pos..], target, cap);
            if length >= MIN_MATCH_LEN && best.is_none_or(|b| length > b.length) {
                best = Some(Match {
                    offset: cursor - pos,
                    length,
                });
                if length == cap {
                    break;
                }
            }
            link = self.prev[pos];
        }
        best
    }
}

// ---------------------------------------------------------------------------
// MatchFinder
// ---------------------------------------------------------------------------

/// Finds the longest backward match at successive cursor positions of one
/// source buffer.
///
/// The hash chain remembers the positions it has indexed, so increasing
/// cursors over one source are cheapest. A smaller cursor than the previous
/// call, or a source of a different length, rebuilds the index. Call
/// [`MatchFinder::reset`] before reusing a finder on different bytes of the
/// same length.
pub struct MatchFinder {
    window_size: usize,
    max_len: Option<usize>,
    strategy: MatchStrategy,
    chain: Option<HashChain>,
}

impl MatchFinder {
    /// Create a finder for a source of `source_len` bytes.
    ///
    /// `HashChain` falls back to `BruteForce` when positions would not fit the
    /// 32-bit chain links.
    pub fn new(
        window_size: usize,
        max_len: Option<usize>,
        strategy: MatchStrategy,
        source_len: usize,
    ) -> Self {
        let chain = match strategy {
            MatchStrategy::HashChain
                if window_size > 0 && (source_len as u64) < u64::from(u32::MAX) =>
            {
                Some(HashChain::new(source_len))
            }
            _ => None,
        };
        let strategy = if chain.is_some() {
            MatchStrategy::HashChain
        } else {
            MatchStrategy::BruteForce
        };
        Self {
            window_size,
            max_len,
            strategy,
            chain,
        }
    }

    /// The strategy in effect (after any fallback).
    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Forget every indexed position.
    pub fn reset(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            let len = chain.prev.len();
            chain.reset(len);
        }
    }

    /// Longest match at `cursor`, or `None` if nothing reaches MIN_MATCH_LEN.
    pub fn find(&mut self, source: &[u8], cursor: usize) -> Option<Match> {
        match self.chain.as_mut() {
            Some(chain) if (source.len() as u64) < u64::from(u32::MAX) => {
                let cap = length_cap(source, cursor, self.max_len);
                if cap < MIN_MATCH_LEN || cursor == 0 {
                    return None;
                }
                chain.find(source, cursor, self.window_size, cap)
            }
            _ => find_longest_match(source, cursor, self.window_size, self.max_len),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
