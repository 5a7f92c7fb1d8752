//! Component tests for compression algorithms
//!
//! Tests individual compression algorithms at the component level.

mod bzip2;
mod zlib;
