//! MPQ table structures (hash, block)

mod block;
mod common;
mod hash;

// Re-export all public types
pub use block::{BlockEntry, BlockTable, FileFlags};
pub use hash::{HashEntry, HashTable};
