//! Frame integrity checks

/// CRC-8, polynomial 0x31, initial value 0x00, MSB first, no reflection,
/// no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |mut crc, &byte| {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x31 } else { crc << 1 };
        }
        crc
    })
}

/// Wrapping 16-bit sum of every byte
pub fn additive_checksum16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}
