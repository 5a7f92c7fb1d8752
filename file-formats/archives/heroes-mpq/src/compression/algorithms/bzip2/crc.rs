//! CRC-32 as used inside bzip2 streams (MSB-first, polynomial 0x04C11DB7)

const POLYNOMIAL: u32 = 0x04C1_1DB7;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u32; 256] = make_table();

/// Running checksum of one block's output
#[derive(Debug, Clone, Copy)]
pub(crate) struct BlockCrc(u32);

impl BlockCrc {
    pub(crate) fn new() -> Self {
        Self(0xFFFF_FFFF)
    }

    #[inline]
    pub(crate) fn update(&mut self, byte: u8) {
        self.0 = (self.0 << 8) ^ CRC_TABLE[((self.0 >> 24) as u8 ^ byte) as usize];
    }

    pub(crate) fn finish(self) -> u32 {
        !self.0
    }
}

/// Fold a block checksum into the stream checksum
pub(crate) fn combine(combined: u32, block: u32) -> u32 {
    combined.rotate_left(1) ^ block
}
