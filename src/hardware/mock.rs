//! Simulated hardware for testing and development

use crate::core::{
    MassConcentration, ParticleCounts, PMS_FRAME_LEN, PMS_HEADER, WEATHER_BATTERY_LOW_FLAG,
    WEATHER_FAMILY_CODE,
};
use crate::hardware::registers::{
    BURST_FLAG, MARCSTATE, MCSM2, PRESENCE_RESET_VALUE, READ_FLAG, RSSI, RXBYTES,
    RXBYTES_COUNT_MASK, RXBYTES_OVERFLOW, RXFIFO, SFRX, SIDLE, SRES, SRX, VERSION,
};
use crate::hardware::{ByteSource, ChipSelectLink, CommError, CommResult};
use crate::processing::checksum::{additive_checksum16, crc8};
use std::collections::VecDeque;

const FIFO_CAPACITY: usize = 64;
const CHIP_VERSION: u8 = 0x14;
const DEFAULT_RSSI: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RadioState {
    Idle,
    Rx,
    RxOverflow,
}

impl RadioState {
    fn marcstate(&self) -> u8 {
        match self {
            RadioState::Idle => 0x01,
            RadioState::Rx => 0x0D,
            RadioState::RxOverflow => 0x11,
        }
    }

    /// STATE field of the chip status byte returned on every transfer
    fn status_byte(&self) -> u8 {
        match self {
            RadioState::Idle => 0x00,
            RadioState::Rx => 0x10,
            RadioState::RxOverflow => 0x60,
        }
    }
}

/// Register-level CC1101 stand-in.
///
/// Bytes queued with [`queue_arrival`](Self::queue_arrival) land in the RX
/// FIFO one chunk per RXBYTES read, which is how a packet streaming in over
/// the air looks to the driver.
pub struct MockChip {
    present: bool,
    registers: [u8; 0x30],
    fifo: VecDeque<u8>,
    arrivals: VecDeque<Vec<u8>>,
    state: RadioState,
    strobes: Vec<u8>,
    rssi: u8,
    fail_fifo_read: bool,
    fail_status_read: Option<u8>,
}

impl MockChip {
    /// A responsive chip, in IDLE after power-up
    pub fn new() -> Self {
        let mut chip = Self {
            present: true,
            registers: [0; 0x30],
            fifo: VecDeque::new(),
            arrivals: VecDeque::new(),
            state: RadioState::Idle,
            strobes: Vec::new(),
            rssi: DEFAULT_RSSI,
            fail_fifo_read: false,
            fail_status_read: None,
        };
        chip.power_on_reset();
        chip
    }

    /// Nothing on the bus; MISO floats high
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new()
        }
    }

    /// Bytes that arrive at the next RXBYTES read
    pub fn queue_arrival(&mut self, bytes: &[u8]) {
        self.arrivals.push_back(bytes.to_vec());
    }

    /// A packet that is half-received when first noticed
    pub fn queue_packet(&mut self, packet: &[u8]) {
        let (head, tail) = packet.split_at(packet.len() / 2);
        self.queue_arrival(head);
        if !tail.is_empty() {
            self.queue_arrival(tail);
        }
    }

    /// Put the FIFO into the overflow state holding `count` bytes
    pub fn force_overflow(&mut self, count: u8) {
        self.fifo.clear();
        self.fifo.extend(std::iter::repeat(0xEE).take(count as usize));
        self.state = RadioState::RxOverflow;
    }

    /// Make the next FIFO burst read fail
    pub fn fail_on_fifo_read(&mut self) {
        self.fail_fifo_read = true;
    }

    /// Make the next read of status register `address` fail
    pub fn fail_on_status_read(&mut self, address: u8) {
        self.fail_status_read = Some(address);
    }

    pub fn set_rssi(&mut self, raw: u8) {
        self.rssi = raw;
    }

    pub fn register(&self, address: u8) -> u8 {
        self.registers[address as usize]
    }

    pub fn strobes(&self) -> &[u8] {
        &self.strobes
    }

    pub fn clear_strobes(&mut self) {
        self.strobes.clear();
    }

    pub fn fifo_is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn is_overflowed(&self) -> bool {
        self.state == RadioState::RxOverflow
    }

    pub fn pending_arrivals(&self) -> usize {
        self.arrivals.len()
    }

    fn power_on_reset(&mut self) {
        self.registers = [0; 0x30];
        self.registers[MCSM2 as usize] = PRESENCE_RESET_VALUE;
        self.fifo.clear();
        self.state = RadioState::Idle;
    }

    fn deliver_arrival(&mut self) {
        if self.state != RadioState::Rx {
            return;
        }
        if let Some(chunk) = self.arrivals.pop_front() {
            for byte in chunk {
                if self.fifo.len() == FIFO_CAPACITY {
                    self.state = RadioState::RxOverflow;
                    break;
                }
                self.fifo.push_back(byte);
            }
        }
    }

    fn strobe(&mut self, command: u8) {
        self.strobes.push(command);
        match command {
            SRES => self.power_on_reset(),
            SIDLE => self.state = RadioState::Idle,
            SFRX => {
                if self.state != RadioState::Rx {
                    self.fifo.clear();
                    if self.state == RadioState::RxOverflow {
                        self.state = RadioState::Idle;
                    }
                }
            }
            SRX => {
                if self.state == RadioState::Idle {
                    self.state = RadioState::Rx;
                }
            }
            _ => {}
        }
    }

    fn read_status(&mut self, address: u8) -> u8 {
        match address {
            RXBYTES => {
                self.deliver_arrival();
                let overflow = if self.state == RadioState::RxOverflow { RXBYTES_OVERFLOW } else { 0 };
                overflow | (self.fifo.len() as u8 & RXBYTES_COUNT_MASK)
            }
            RSSI => self.rssi,
            MARCSTATE => self.state.marcstate(),
            VERSION => CHIP_VERSION,
            _ => 0,
        }
    }
}

impl Default for MockChip {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipSelectLink for MockChip {
    fn exchange(&mut self, frame: &mut [u8]) -> CommResult<()> {
        if frame.is_empty() {
            return Err(CommError::BufferError {
                operation: "empty exchange".to_string(),
            });
        }
        if !self.present {
            frame.iter_mut().for_each(|b| *b = 0xFF);
            return Ok(());
        }

        let header = frame[0];
        let address = header & 0x3F;
        let read = header & READ_FLAG != 0;
        let burst = header & BURST_FLAG != 0;
        frame[0] = self.state.status_byte();

        if address == RXFIFO {
            if read {
                if self.fail_fifo_read {
                    self.fail_fifo_read = false;
                    return Err(CommError::BusFault {
                        operation: "fifo read".to_string(),
                        details: "simulated".to_string(),
                    });
                }
                for byte in frame.iter_mut().skip(1) {
                    *byte = self.fifo.pop_front().unwrap_or(0);
                }
            }
            return Ok(());
        }

        if address >= 0x30 {
            if frame.len() == 1 {
                self.strobe(address);
            } else if read && burst {
                if self.fail_status_read == Some(address) {
                    self.fail_status_read = None;
                    return Err(CommError::BusFault {
                        operation: format!("status read 0x{:02X}", address),
                        details: "simulated".to_string(),
                    });
                }
                frame[1] = self.read_status(address);
            }
            return Ok(());
        }

        for (offset, byte) in frame.iter_mut().skip(1).enumerate() {
            let register = if burst { address as usize + offset } else { address as usize };
            if register >= self.registers.len() {
                break;
            }
            if read {
                *byte = self.registers[register];
            } else {
                self.registers[register] = *byte;
            }
        }
        Ok(())
    }
}

/// Scripted UART: every read returns at most the next queued chunk
#[derive(Default)]
pub struct MockUart {
    chunks: VecDeque<Vec<u8>>,
}

impl MockUart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, bytes: &[u8]) {
        self.chunks.push_back(bytes.to_vec());
    }

    /// Queue `bytes` split into chunks of `size`
    pub fn push_chunked(&mut self, bytes: &[u8], size: usize) {
        for chunk in bytes.chunks(size.max(1)) {
            self.push_chunk(chunk);
        }
    }

    pub fn is_drained(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl ByteSource for MockUart {
    fn read_available(&mut self, buf: &mut [u8]) -> CommResult<usize> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            self.chunks.push_front(chunk.split_off(n));
        }
        Ok(n)
    }
}

/// Field values for building a well-formed weather transmission
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedWeather {
    pub family: u8,
    pub station_id: u32,
    pub battery_low: bool,
    /// Already offset and scaled: `C * 10 + 400`
    pub raw_temperature: u16,
    pub humidity_pct: u8,
    pub wind_direction_deg: u16,
    /// Tenths of m/s
    pub wind_speed_raw: u8,
    pub wind_gust_raw: u8,
    /// Tenths of mm
    pub rain_raw: u32,
    pub uv_index: u8,
    pub illuminance: Option<u32>,
}

impl Default for SimulatedWeather {
    fn default() -> Self {
        Self {
            family: WEATHER_FAMILY_CODE,
            station_id: 0x123456,
            battery_low: false,
            raw_temperature: 404,
            humidity_pct: 50,
            wind_direction_deg: 45,
            wind_speed_raw: 10,
            wind_gust_raw: 20,
            rain_raw: 100,
            uv_index: 5,
            illuminance: Some(300),
        }
    }
}

impl SimulatedWeather {
    /// Encoded frame with its CRC-8 appended
    pub fn to_frame(&self) -> Vec<u8> {
        let id = self.station_id.to_be_bytes();
        let direction = self.wind_direction_deg.to_be_bytes();
        let rain = self.rain_raw.to_be_bytes();

        let mut frame = vec![
            self.family,
            id[1],
            id[2],
            id[3],
            if self.battery_low { WEATHER_BATTERY_LOW_FLAG } else { 0x00 },
            ((self.raw_temperature >> 8) & 0x0F) as u8,
            (self.raw_temperature & 0xFF) as u8,
            self.humidity_pct,
            direction[0],
            direction[1],
            self.wind_speed_raw,
            self.wind_gust_raw,
            rain[1],
            rain[2],
            rain[3],
            self.uv_index,
        ];
        if let Some(lux) = self.illuminance {
            frame.extend_from_slice(&lux.to_be_bytes());
        }
        frame.push(crc8(&frame));
        frame
    }
}

/// Field values for building a well-formed particulate frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedParticulate {
    pub standard: MassConcentration,
    pub atmospheric: MassConcentration,
    pub counts: ParticleCounts,
}

impl SimulatedParticulate {
    /// Encoded 32-byte frame with its additive checksum
    pub fn to_frame(&self) -> [u8; PMS_FRAME_LEN] {
        let words = [
            (PMS_FRAME_LEN - 4) as u16,
            self.standard.pm1_0,
            self.standard.pm2_5,
            self.standard.pm10,
            self.atmospheric.pm1_0,
            self.atmospheric.pm2_5,
            self.atmospheric.pm10,
            self.counts.gt0_3um,
            self.counts.gt0_5um,
            self.counts.gt1_0um,
            self.counts.gt2_5um,
            self.counts.gt5_0um,
            self.counts.gt10um,
            0x9700, // version / error code
        ];

        let mut frame = [0u8; PMS_FRAME_LEN];
        frame[..2].copy_from_slice(&PMS_HEADER);
        for (i, word) in words.iter().enumerate() {
            frame[2 + i * 2..4 + i * 2].copy_from_slice(&word.to_be_bytes());
        }
        let checksum = additive_checksum16(&frame[..PMS_FRAME_LEN - 2]);
        frame[PMS_FRAME_LEN - 2..].copy_from_slice(&checksum.to_be_bytes());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_chip_reads_high() {
        let mut chip = MockChip::absent();
        let mut frame = [MCSM2 | READ_FLAG, 0];
        chip.exchange(&mut frame).unwrap();
        assert_eq!(frame[1], 0xFF);
    }

    #[test]
    fn test_arrivals_need_rx() {
        let mut chip = MockChip::new();
        chip.queue_arrival(&[1, 2, 3]);

        let mut frame = [RXBYTES | READ_FLAG | BURST_FLAG, 0];
        chip.exchange(&mut frame).unwrap();
        assert_eq!(frame[1], 0);
        assert_eq!(chip.pending_arrivals(), 1);

        chip.exchange(&mut [SRX]).unwrap();
        let mut frame = [RXBYTES | READ_FLAG | BURST_FLAG, 0];
        chip.exchange(&mut frame).unwrap();
        assert_eq!(frame[1], 3);
    }

    #[test]
    fn test_fifo_overflow() {
        let mut chip = MockChip::new();
        chip.exchange(&mut [SRX]).unwrap();
        chip.queue_arrival(&[0u8; 70]);

        let mut frame = [RXBYTES | READ_FLAG | BURST_FLAG, 0];
        chip.exchange(&mut frame).unwrap();
        assert_eq!(frame[1], RXBYTES_OVERFLOW | 64);
        assert!(chip.is_overflowed());
    }

    #[test]
    fn test_mock_uart_splits_oversized_chunks() {
        let mut uart = MockUart::new();
        uart.push_chunk(&[1, 2, 3, 4, 5]);

        let mut buf = [0u8; 2];
        assert_eq!(uart.read_available(&mut buf).unwrap(), 2);
        assert_eq!(uart.read_available(&mut buf).unwrap(), 2);
        assert_eq!(uart.read_available(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 5);
        assert_eq!(uart.read_available(&mut buf).unwrap(), 0);
        assert!(uart.is_drained());
    }

    #[test]
    fn test_simulated_weather_matches_reference_layout() {
        let frame = SimulatedWeather::default().to_frame();
        assert_eq!(
            frame,
            vec![
                0x24, 0x12, 0x34, 0x56, 0x00, 0x01, 0x94, 0x32, 0x00, 0x2D, 0x0A, 0x14, 0x00,
                0x00, 0x64, 0x05, 0x00, 0x00, 0x01, 0x2C, 0x80,
            ]
        );
    }
}
