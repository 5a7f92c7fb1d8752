//! Compression method definitions and flags

/// Compression method flags
pub mod flags {
    /// Huffman encoding (WAVE files only)
    pub const HUFFMAN: u8 = 0x01;
    /// Deflate/zlib compression
    pub const ZLIB: u8 = 0x02;
    /// PKWare DCL compression
    pub const PKWARE: u8 = 0x08;
    /// BZip2 compression
    pub const BZIP2: u8 = 0x10;
    /// LZMA compression (not a flag combination)
    pub const LZMA: u8 = 0x12;
    /// Sparse/RLE compression
    pub const SPARSE: u8 = 0x20;
    /// IMA ADPCM mono
    pub const ADPCM_MONO: u8 = 0x40;
    /// IMA ADPCM stereo
    pub const ADPCM_STEREO: u8 = 0x80;
}

/// Codec selected by the method byte at the start of a compressed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// Deflate/zlib compression
    Zlib,
    /// BZip2 compression
    BZip2,
    /// A method this reader does not decode
    Unsupported {
        /// The raw method byte
        method: u8,
        /// Human-readable codec name
        name: &'static str,
    },
}

impl CompressionMethod {
    /// Determine the codec from a method byte
    pub fn from_byte(method: u8) -> Self {
        let name = match method {
            flags::ZLIB => return CompressionMethod::Zlib,
            flags::BZIP2 => return CompressionMethod::BZip2,
            flags::HUFFMAN => "Huffman",
            flags::PKWARE => "PKWARE implode",
            flags::LZMA => "LZMA",
            flags::ADPCM_MONO => "IMA ADPCM mono",
            flags::ADPCM_STEREO => "IMA ADPCM stereo",
            0x22 => "sparse + zlib",
            0x30 => "sparse + bzip2",
            0x41 => "IMA ADPCM mono + Huffman",
            0x48 => "IMA ADPCM mono + PKWARE implode",
            0x81 => "IMA ADPCM stereo + Huffman",
            0x88 => "IMA ADPCM stereo + PKWARE implode",
            _ => "unknown",
        };
        CompressionMethod::Unsupported { method, name }
    }

    /// Check if this reader can decode the method
    pub fn is_supported(&self) -> bool {
        !matches!(self, CompressionMethod::Unsupported { .. })
    }
}
