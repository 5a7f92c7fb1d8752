//! Decompression of MPQ blocks
//!
//! Compressed blocks start with a method byte naming the codec. Zlib is
//! delegated to `flate2`; bzip2 is decoded in-house by
//! [`algorithms::bzip2`]. All other methods are recognised and reported as
//! unsupported.

pub mod algorithms;
mod decompress;
mod methods;

// Re-export the main public API
pub use decompress::{decompress, decompress_in_place};
pub use methods::{CompressionMethod, flags};
