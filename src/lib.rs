//! Oxilz: LZ77 sliding-window compression in Rust.
//!
//! The crate provides:
//! - The LZ77 core: match finder, token model and two wire formats (`lz77`)
//! - Whole-buffer compression APIs (`compress`)
//! - File-oriented helpers and the round-trip harness (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Wire formats
//!
//! - [`Format::EscapedFixedWidth`]: literals verbatim with 0xFF doubled;
//!   matches as `0xFF` plus 14-bit `offset - 1` and 10-bit length. Windows up
//!   to 8192 bytes, matches up to 1023 bytes.
//! - [`Format::VlqTagged`]: literals verbatim with 0x00 doubled; matches as
//!   `0x00` plus VLQ offset and VLQ length. No width limits.
//!
//! Both formats use the same greedy parse: longest match in the window,
//! smallest offset on ties, matches of at least 5 bytes.
//!
//! # Quick Start
//!
//! ```
//! use oxilz::compress::{self, CompressOptions};
//! use oxilz::Format;
//!
//! let data = b"to be or not to be, that is the question; to be or not to be";
//! let opts = CompressOptions::for_format(Format::VlqTagged);
//! let packed = compress::compress(data, &opts).unwrap();
//! let unpacked = compress::decompress(&packed, Format::VlqTagged).unwrap();
//! assert_eq!(unpacked, data);
//! ```

pub mod compress;
pub mod io;
pub mod lz77;

#[cfg(feature = "cli")]
pub mod cli;

pub use lz77::{Format, Match, Token};
