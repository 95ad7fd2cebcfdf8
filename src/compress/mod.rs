// Whole-buffer compression API.
//
// This module wraps the LZ77 core in the two call shapes callers use:
//
// - `encoder`: `compress` / `compress_into`, options, `Encoder` handle
// - `decoder`: `decompress` / `decompress_into`, `Decoder` handle

pub mod decoder;
pub mod encoder;

pub use decoder::{DecompressError, Decoder, decompress, decompress_into};
pub use encoder::{CompressError, CompressOptions, Encoder, compress, compress_into};
