//! Error types for the MPQ reader

use std::io;
use thiserror::Error;

/// Result type alias for MPQ operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for MPQ operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid MPQ format (bad magic, extended header fields, bad table geometry)
    #[error("Invalid MPQ format: {0}")]
    InvalidFormat(String),

    /// File not found in archive
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Structural or checksum failure in a compressed stream or block table
    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    /// Compression method that this reader does not implement
    #[error("Unsupported compression 0x{method:02X} ({name})")]
    UnsupportedCodec {
        /// The method byte found at the start of the block
        method: u8,
        /// Human-readable codec name
        name: &'static str,
    },

    /// Encrypted data whose key could not be derived
    #[error("Unable to determine encryption key for {0}")]
    EncryptionKeyUnknown(String),

    /// Compression/decompression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// Invalid file size
    #[error("Invalid file size: expected {expected}, got {actual}")]
    InvalidFileSize {
        /// Expected size
        expected: u64,
        /// Actual size
        actual: u64,
    },
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new CorruptStream error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::CorruptStream(msg.into())
    }

    /// Create a new Compression error
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Error::Compression(msg.into())
    }

    /// Create a new EncryptionKeyUnknown error
    pub fn key_unknown<S: Into<String>>(what: S) -> Self {
        Error::EncryptionKeyUnknown(what.into())
    }

    /// Check if this error indicates the archive or stream is corrupted
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::InvalidFormat(_) | Error::CorruptStream(_))
    }

    /// Check if the archive handle stays usable after this error
    ///
    /// Every error except a failed open is local to the call that raised it;
    /// this reports the ones a caller can meaningfully work around.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_)
                | Error::UnsupportedCodec { .. }
                | Error::EncryptionKeyUnknown(_)
                | Error::InvalidFileSize { .. }
        )
    }
}
