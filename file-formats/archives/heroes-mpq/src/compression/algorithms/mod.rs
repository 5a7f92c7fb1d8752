//! Individual codec implementations

pub mod bzip2;
pub(crate) mod zlib;
