//! CC1101 register map and receive configuration
//!
//! 2-FSK, ~17.24 kbps, 16-bit sync word 0x2DD4, fixed-length packets of up
//! to 80 bytes, automatic calibration when leaving IDLE. Only the three
//! frequency-word registers depend on the selected band.

use serde::{Deserialize, Serialize};

/// Header bit selecting a read access
pub const READ_FLAG: u8 = 0x80;
/// Header bit selecting burst access (and status registers)
pub const BURST_FLAG: u8 = 0x40;

// Configuration registers
pub const IOCFG2: u8 = 0x00;
pub const IOCFG0: u8 = 0x02;
pub const FIFOTHR: u8 = 0x03;
pub const SYNC1: u8 = 0x04;
pub const SYNC0: u8 = 0x05;
pub const PKTLEN: u8 = 0x06;
pub const PKTCTRL1: u8 = 0x07;
pub const PKTCTRL0: u8 = 0x08;
pub const ADDR: u8 = 0x09;
pub const CHANNR: u8 = 0x0A;
pub const FSCTRL1: u8 = 0x0B;
pub const FSCTRL0: u8 = 0x0C;
pub const FREQ2: u8 = 0x0D;
pub const FREQ1: u8 = 0x0E;
pub const FREQ0: u8 = 0x0F;
pub const MDMCFG4: u8 = 0x10;
pub const MDMCFG3: u8 = 0x11;
pub const MDMCFG2: u8 = 0x12;
pub const MDMCFG1: u8 = 0x13;
pub const MDMCFG0: u8 = 0x14;
pub const DEVIATN: u8 = 0x15;
pub const MCSM2: u8 = 0x16;
pub const MCSM1: u8 = 0x17;
pub const MCSM0: u8 = 0x18;
pub const FOCCFG: u8 = 0x19;
pub const BSCFG: u8 = 0x1A;
pub const AGCCTRL2: u8 = 0x1B;
pub const AGCCTRL1: u8 = 0x1C;
pub const AGCCTRL0: u8 = 0x1D;
pub const FREND1: u8 = 0x21;
pub const FREND0: u8 = 0x22;
pub const FSCAL3: u8 = 0x23;
pub const FSCAL2: u8 = 0x24;
pub const FSCAL1: u8 = 0x25;
pub const FSCAL0: u8 = 0x26;
pub const TEST2: u8 = 0x2C;
pub const TEST1: u8 = 0x2D;
pub const TEST0: u8 = 0x2E;

// Command strobes
pub const SRES: u8 = 0x30;
pub const SRX: u8 = 0x34;
pub const SIDLE: u8 = 0x36;
pub const SFRX: u8 = 0x3A;

// Status registers (read with the burst bit)
pub const VERSION: u8 = 0x31;
pub const RSSI: u8 = 0x34;
pub const MARCSTATE: u8 = 0x35;
pub const RXBYTES: u8 = 0x3B;

/// RX FIFO access address
pub const RXFIFO: u8 = 0x3F;

/// RXBYTES: FIFO overflowed since the last flush
pub const RXBYTES_OVERFLOW: u8 = 0x80;
/// RXBYTES: number of bytes waiting in the FIFO
pub const RXBYTES_COUNT_MASK: u8 = 0x7F;

/// Register read back for chip presence. The configuration table leaves it
/// alone, so after `SRES` it must still read its reset value.
pub const PRESENCE_REGISTER: u8 = MCSM2;
pub const PRESENCE_RESET_VALUE: u8 = 0x07;

/// Band-independent register settings, written in order after `SRES`
pub const BASE_CONFIG: [(u8, u8); 31] = [
    (IOCFG2, 0x0E),   // GDO2: carrier sense
    (IOCFG0, 0x06),   // GDO0: sync word seen / end of packet
    (FIFOTHR, 0x47),  // RX attenuation 0 dB, FIFO threshold 33 bytes
    (SYNC1, 0x2D),
    (SYNC0, 0xD4),
    (PKTLEN, 0x50),   // 80 bytes
    (PKTCTRL1, 0x00), // no address check, no status append
    (PKTCTRL0, 0x00), // fixed length, no whitening, no hardware CRC
    (ADDR, 0x00),
    (CHANNR, 0x00),
    (FSCTRL1, 0x06),  // IF 152 kHz
    (FSCTRL0, 0x00),
    (MDMCFG4, 0x89),  // RX bandwidth 203 kHz, DRATE_E 9
    (MDMCFG3, 0x5C),  // DRATE_M 92 -> 17.26 kbps
    (MDMCFG2, 0x02),  // 2-FSK, 16/16 sync bits, no Manchester
    (MDMCFG1, 0x22),  // 4 preamble bytes
    (MDMCFG0, 0xF8),
    (DEVIATN, 0x34),  // 19 kHz deviation
    (MCSM1, 0x3C),    // stay in RX after a packet
    (MCSM0, 0x18),    // calibrate when going from IDLE to RX
    (FOCCFG, 0x16),
    (BSCFG, 0x6C),
    (AGCCTRL2, 0x43),
    (AGCCTRL1, 0x40),
    (AGCCTRL0, 0x91),
    (FREND1, 0x56),
    (FREND0, 0x10),
    (FSCAL3, 0xE9),
    (FSCAL2, 0x2A),
    (FSCAL1, 0x00),
    (FSCAL0, 0x1F),
];

/// Analog test settings recommended by SmartRF Studio for this data rate
pub const TEST_CONFIG: [(u8, u8); 3] = [(TEST2, 0x81), (TEST1, 0x35), (TEST0, 0x09)];

/// Supported receive bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyBand {
    /// 868.3 MHz (EU transmitters)
    Mhz868,
    /// 915.0 MHz (US transmitters)
    Mhz915,
}

impl FrequencyBand {
    /// FREQ2/FREQ1/FREQ0 for a 26 MHz crystal: `f * 2^16 / 26 MHz`
    pub fn frequency_word(&self) -> [u8; 3] {
        match self {
            FrequencyBand::Mhz868 => [0x21, 0x65, 0x6A],
            FrequencyBand::Mhz915 => [0x23, 0x31, 0x3B],
        }
    }

    pub fn from_mhz(mhz: u16) -> Option<Self> {
        match mhz {
            868 => Some(FrequencyBand::Mhz868),
            915 => Some(FrequencyBand::Mhz915),
            _ => None,
        }
    }

    pub fn mhz(&self) -> u16 {
        match self {
            FrequencyBand::Mhz868 => 868,
            FrequencyBand::Mhz915 => 915,
        }
    }
}

/// Full write sequence for a band: base table, frequency word, test registers
pub fn configuration_table(band: FrequencyBand) -> Vec<(u8, u8)> {
    let [freq2, freq1, freq0] = band.frequency_word();
    let mut table = Vec::with_capacity(BASE_CONFIG.len() + 3 + TEST_CONFIG.len());
    table.extend_from_slice(&BASE_CONFIG);
    table.extend_from_slice(&[(FREQ2, freq2), (FREQ1, freq1), (FREQ0, freq0)]);
    table.extend_from_slice(&TEST_CONFIG);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_words() {
        // 0x21656A * 26 MHz / 2^16 ~= 868.3 MHz
        let word = FrequencyBand::Mhz868.frequency_word();
        let raw = u32::from_be_bytes([0, word[0], word[1], word[2]]);
        let mhz = raw as f64 * 26.0 / 65536.0;
        assert!((mhz - 868.3).abs() < 0.001);

        let word = FrequencyBand::Mhz915.frequency_word();
        let raw = u32::from_be_bytes([0, word[0], word[1], word[2]]);
        let mhz = raw as f64 * 26.0 / 65536.0;
        assert!((mhz - 915.0).abs() < 0.001);
    }

    #[test]
    fn test_table_only_differs_in_frequency() {
        let a = configuration_table(FrequencyBand::Mhz868);
        let b = configuration_table(FrequencyBand::Mhz915);
        assert_eq!(a.len(), b.len());

        let differing: Vec<u8> = a
            .iter()
            .zip(b.iter())
            .filter(|(x, y)| x != y)
            .map(|(x, _)| x.0)
            .collect();
        assert_eq!(differing, vec![FREQ2, FREQ1, FREQ0]);
    }

    #[test]
    fn test_table_leaves_presence_register_alone() {
        let table = configuration_table(FrequencyBand::Mhz868);
        assert!(table.iter().all(|(addr, _)| *addr != PRESENCE_REGISTER));
    }

    #[test]
    fn test_band_from_mhz() {
        assert_eq!(FrequencyBand::from_mhz(868), Some(FrequencyBand::Mhz868));
        assert_eq!(FrequencyBand::from_mhz(915), Some(FrequencyBand::Mhz915));
        assert_eq!(FrequencyBand::from_mhz(433), None);
    }
}
