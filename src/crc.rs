//! CRC-32 as used by PNG chunks (ISO-HDLC, reflected polynomial).

/// Reflected form of the IEEE 802.3 polynomial.
const POLYNOMIAL: u32 = 0xEDB8_8320;

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { POLYNOMIAL ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Partial remainders for every byte value, computed at compile time.
const CRC_TABLE: [u32; 256] = build_table();

/// Running CRC-32 over a byte stream.
///
/// In a PNG chunk the checksum covers the type tag and the payload, never the
/// length field or the stored CRC itself.
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Crc32 { crc: u32::MAX }
    }

    /// Feeds `bytes` into the running checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.crc = CRC_TABLE[((self.crc ^ b as u32) & 0xFF) as usize] ^ (self.crc >> 8);
        }
    }

    /// Checksum of everything fed so far. Does not consume the state, so more
    /// bytes may still be fed afterwards.
    pub fn finalize(&self) -> u32 {
        self.crc ^ u32::MAX
    }

    pub fn reset(&mut self) {
        self.crc = u32::MAX;
    }

    /// One-shot checksum of `bytes`.
    pub fn checksum(bytes: &[u8]) -> u32 {
        let mut crc = Crc32::new();
        crc.update(bytes);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Crc32::new()
    }
}
