//! Receive-only driver for the sub-GHz FSK transceiver

use crate::core::{monotonic_ms, MAX_PACKET_LEN, PACKET_SETTLE_DELAY_MS};
use crate::hardware::registers::{
    self, FrequencyBand, MARCSTATE, PRESENCE_REGISTER, PRESENCE_RESET_VALUE, RSSI,
    RXBYTES, RXBYTES_COUNT_MASK, RXBYTES_OVERFLOW, RXFIFO, SFRX, SIDLE, SRES, SRX, VERSION,
};
use crate::hardware::{ChipSelectLink, CommError, CommResult, Delay, RawPacket, RegisterBus};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

/// MARCSTATE value while the radio is in RX
const MARCSTATE_RX: u8 = 0x0D;

/// Transceiver configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransceiverConfig {
    /// Receive band; selects the frequency word
    pub band: FrequencyBand,
    /// Wait after the first FIFO bytes appear before draining (milliseconds)
    pub settle_delay_ms: u32,
    /// Upper bound on a single FIFO drain (bytes)
    pub max_packet_len: usize,
}

impl Default for TransceiverConfig {
    fn default() -> Self {
        Self {
            band: FrequencyBand::Mhz868,
            settle_delay_ms: PACKET_SETTLE_DELAY_MS,
            max_packet_len: MAX_PACKET_LEN,
        }
    }
}

impl TransceiverConfig {
    pub fn for_band(band: FrequencyBand) -> Self {
        Self { band, ..Default::default() }
    }

    pub fn validate(&self) -> CommResult<()> {
        if self.settle_delay_ms == 0 || self.settle_delay_ms > 1000 {
            return Err(CommError::ConfigurationError {
                parameter: "settle_delay_ms".to_string(),
                value: self.settle_delay_ms.to_string(),
            });
        }

        if self.max_packet_len == 0 || self.max_packet_len > MAX_PACKET_LEN {
            return Err(CommError::ConfigurationError {
                parameter: "max_packet_len".to_string(),
                value: self.max_packet_len.to_string(),
            });
        }

        Ok(())
    }
}

/// Where the receive state machine currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveState {
    /// Not configured, or configuration failed
    Idle,
    /// In RX with an empty, freshly flushed FIFO
    Listening,
    /// Bytes seen in the FIFO, waiting for the packet to finish arriving
    Draining,
}

/// Transceiver status information
#[derive(Debug, Clone, PartialEq)]
pub struct TransceiverStatus {
    pub band: FrequencyBand,
    pub state: ReceiveState,
    pub chip_detected: bool,
    pub chip_version: Option<u8>,
    pub packets_received: u32,
    pub overflows: u32,
    pub last_packet_time: Option<u64>,
}

impl TransceiverStatus {
    pub fn new(band: FrequencyBand) -> Self {
        Self {
            band,
            state: ReceiveState::Idle,
            chip_detected: false,
            chip_version: None,
            packets_received: 0,
            overflows: 0,
            last_packet_time: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.chip_detected && self.state != ReceiveState::Idle
    }
}

/// CC1101 receive driver.
///
/// The chip has no packet-complete signal in this configuration, so
/// [`poll_for_packet`](Self::poll_for_packet) watches FIFO occupancy and
/// waits a fixed settle delay before draining. Every drain or overflow is
/// followed by IDLE, flush and RX, so the chip is never left half-read.
pub struct TransceiverDriver<L, D> {
    bus: RegisterBus<L>,
    delay: D,
    config: TransceiverConfig,
    status: TransceiverStatus,
}

impl<L: ChipSelectLink, D: Delay> TransceiverDriver<L, D> {
    /// Create a driver; nothing is sent to the chip until [`initialize`](Self::initialize)
    pub fn new(link: L, delay: D, config: TransceiverConfig) -> CommResult<Self> {
        config.validate()?;

        Ok(Self {
            bus: RegisterBus::new(link),
            delay,
            status: TransceiverStatus::new(config.band),
            config,
        })
    }

    /// Reset the chip, load the receive configuration and start listening.
    ///
    /// Returns `ChipNotDetected` when the presence check does not read back
    /// its reset value. The driver stays `Idle` and may be initialized again.
    pub fn initialize(&mut self) -> CommResult<()> {
        self.status.state = ReceiveState::Idle;
        self.status.chip_detected = false;

        self.bus.strobe(SRES)?;
        for (address, value) in registers::configuration_table(self.config.band) {
            self.bus.write_register(address, value)?;
        }

        let presence = self.bus.read_register(PRESENCE_REGISTER)?;
        if presence != PRESENCE_RESET_VALUE {
            debug!(
                "Presence check: register 0x{:02X} read 0x{:02X}",
                PRESENCE_REGISTER, presence
            );
            return Err(CommError::ChipNotDetected {
                register: PRESENCE_REGISTER,
                expected: PRESENCE_RESET_VALUE,
                received: presence,
            });
        }

        let version = self.bus.read_status(VERSION)?;
        self.rearm()?;
        self.status.chip_version = Some(version);
        self.status.chip_detected = true;

        info!(
            "Transceiver ready on {} MHz (chip version 0x{:02X})",
            self.config.band.mhz(),
            version
        );
        Ok(())
    }

    /// Check the FIFO and return a complete packet if one is waiting.
    ///
    /// Overflow is not an error: the FIFO is discarded, the radio re-armed
    /// and `Ok(None)` returned.
    pub fn poll_for_packet(&mut self) -> CommResult<Option<RawPacket>> {
        if !self.status.chip_detected {
            return Ok(None);
        }

        let occupancy = self.bus.read_status(RXBYTES)?;
        if occupancy & RXBYTES_OVERFLOW != 0 {
            self.recover_overflow()?;
            return Ok(None);
        }
        if occupancy & RXBYTES_COUNT_MASK == 0 {
            return Ok(None);
        }

        self.status.state = ReceiveState::Draining;
        self.delay.delay_ms(self.config.settle_delay_ms);

        let occupancy = self.bus.read_status(RXBYTES)?;
        if occupancy & RXBYTES_OVERFLOW != 0 {
            self.recover_overflow()?;
            return Ok(None);
        }
        let pending = (occupancy & RXBYTES_COUNT_MASK) as usize;
        if pending == 0 {
            self.status.state = ReceiveState::Listening;
            return Ok(None);
        }

        let count = pending.min(self.config.max_packet_len);
        let drained = self.drain_fifo(count);
        self.rearm()?;
        let (data, rssi_raw) = drained?;

        let timestamp = monotonic_ms();
        self.status.packets_received += 1;
        self.status.last_packet_time = Some(timestamp);
        trace!("Received {} byte packet", data.len());

        Ok(Some(
            RawPacket::new(data)
                .with_timestamp(timestamp)
                .with_rssi_dbm(rssi_to_dbm(rssi_raw)),
        ))
    }

    /// Leave RX, discard the FIFO and enter RX again
    pub fn rearm(&mut self) -> CommResult<()> {
        self.bus.strobe(SIDLE)?;
        self.bus.strobe(SFRX)?;
        self.bus.strobe(SRX)?;
        self.status.state = ReceiveState::Listening;
        Ok(())
    }

    /// Whether the radio state machine reports RX
    pub fn is_receiving(&mut self) -> CommResult<bool> {
        Ok(self.bus.read_status(MARCSTATE)? & 0x1F == MARCSTATE_RX)
    }

    pub fn status(&self) -> &TransceiverStatus {
        &self.status
    }

    pub fn config(&self) -> &TransceiverConfig {
        &self.config
    }

    pub fn link(&self) -> &L {
        self.bus.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.bus.link_mut()
    }

    fn drain_fifo(&mut self, count: usize) -> CommResult<(Vec<u8>, u8)> {
        let mut buf = [0u8; MAX_PACKET_LEN];
        self.bus.burst_read(RXFIFO, &mut buf[..count])?;
        let rssi = self.bus.read_status(RSSI)?;
        Ok((buf[..count].to_vec(), rssi))
    }

    fn recover_overflow(&mut self) -> CommResult<()> {
        self.status.overflows += 1;
        debug!("RX FIFO overflow, discarding buffer");
        self.rearm()
    }
}

/// RSSI register is two's complement in half-dB steps with a 74 dB offset
fn rssi_to_dbm(raw: u8) -> i16 {
    (raw as i8) as i16 / 2 - 74
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::MockChip;
    use crate::hardware::NoDelay;

    fn driver(chip: MockChip) -> TransceiverDriver<MockChip, NoDelay> {
        TransceiverDriver::new(chip, NoDelay::default(), TransceiverConfig::default()).unwrap()
    }

    fn ready_driver() -> TransceiverDriver<MockChip, NoDelay> {
        let mut driver = driver(MockChip::new());
        driver.initialize().unwrap();
        driver.link_mut().clear_strobes();
        driver
    }

    #[test]
    fn test_initialize_writes_band_and_listens() {
        let mut driver = driver(MockChip::new());
        driver.initialize().unwrap();

        let chip = driver.link();
        assert_eq!(chip.register(registers::FREQ2), 0x21);
        assert_eq!(chip.register(registers::FREQ1), 0x65);
        assert_eq!(chip.register(registers::FREQ0), 0x6A);
        assert_eq!(chip.register(registers::SYNC1), 0x2D);
        assert_eq!(chip.register(registers::SYNC0), 0xD4);
        assert_eq!(chip.strobes().first(), Some(&SRES));
        assert_eq!(&chip.strobes()[chip.strobes().len() - 2..], &[SFRX, SRX]);

        assert!(driver.status().is_healthy());
        assert_eq!(driver.status().state, ReceiveState::Listening);
        assert!(driver.is_receiving().unwrap());
    }

    #[test]
    fn test_initialize_other_band() {
        let config = TransceiverConfig::for_band(FrequencyBand::Mhz915);
        let mut driver = TransceiverDriver::new(MockChip::new(), NoDelay::default(), config).unwrap();
        driver.initialize().unwrap();
        assert_eq!(driver.link().register(registers::FREQ2), 0x23);
        assert_eq!(driver.link().register(registers::FREQ0), 0x3B);
    }

    #[test]
    fn test_missing_chip_is_reported() {
        let mut driver = driver(MockChip::absent());
        let result = driver.initialize();

        assert!(matches!(
            result,
            Err(CommError::ChipNotDetected { received: 0xFF, expected: 0x07, .. })
        ));
        assert!(!driver.status().chip_detected);
        assert_eq!(driver.status().state, ReceiveState::Idle);
        assert_eq!(driver.poll_for_packet().unwrap(), None);
    }

    #[test]
    fn test_failed_bring_up_leaves_chip_undetected() {
        let mut chip = MockChip::new();
        chip.fail_on_status_read(VERSION);
        let mut driver = driver(chip);

        assert!(matches!(driver.initialize(), Err(CommError::BusFault { .. })));
        assert!(!driver.status().chip_detected);
        assert_eq!(driver.status().state, ReceiveState::Idle);

        driver.link_mut().queue_packet(&[0x11; 21]);
        assert_eq!(driver.poll_for_packet().unwrap(), None);
        assert_eq!(driver.link().pending_arrivals(), 2);

        driver.initialize().unwrap();
        assert!(driver.status().is_healthy());
    }

    #[test]
    fn test_empty_fifo_returns_nothing() {
        let mut driver = ready_driver();
        assert_eq!(driver.poll_for_packet().unwrap(), None);
        assert!(driver.link().strobes().is_empty());
    }

    #[test]
    fn test_packet_is_drained_after_settle() {
        let mut driver = ready_driver();
        let packet: Vec<u8> = (1..=21).collect();
        driver.link_mut().queue_packet(&packet);
        driver.link_mut().set_rssi(0xC0);

        let received = driver.poll_for_packet().unwrap().expect("packet");
        assert_eq!(received.data, packet);
        assert_eq!(received.rssi_dbm, Some(-106));
        assert_eq!(driver.status().packets_received, 1);
        assert_eq!(driver.link().strobes(), &[SIDLE, SFRX, SRX]);
        assert!(driver.link().fifo_is_empty());
        assert_eq!(driver.status().state, ReceiveState::Listening);
    }

    #[test]
    fn test_settle_delay_is_requested() {
        let mut driver = ready_driver();
        driver.link_mut().queue_packet(&[0xAA; 17]);
        driver.poll_for_packet().unwrap();
        assert_eq!(driver.delay.requested_ms, PACKET_SETTLE_DELAY_MS as u64);
    }

    #[test]
    fn test_overflow_always_rearms() {
        for count in [0u8, 1, 17, 64] {
            let mut driver = ready_driver();
            driver.link_mut().force_overflow(count);

            assert_eq!(driver.poll_for_packet().unwrap(), None);
            assert_eq!(driver.link().strobes(), &[SIDLE, SFRX, SRX]);
            assert!(driver.link().fifo_is_empty());
            assert!(!driver.link().is_overflowed());
            assert_eq!(driver.status().overflows, 1);
            assert!(driver.is_receiving().unwrap());
        }
    }

    #[test]
    fn test_overflow_during_settle_rearms() {
        let mut driver = ready_driver();
        driver.link_mut().queue_arrival(&[0x24; 10]);
        driver.link_mut().queue_arrival(&[0x00; 60]);

        assert_eq!(driver.poll_for_packet().unwrap(), None);
        assert_eq!(driver.link().strobes(), &[SIDLE, SFRX, SRX]);
        assert_eq!(driver.status().overflows, 1);
    }

    #[test]
    fn test_drain_is_capped() {
        let config = TransceiverConfig { max_packet_len: 16, ..Default::default() };
        let mut driver = TransceiverDriver::new(MockChip::new(), NoDelay::default(), config).unwrap();
        driver.initialize().unwrap();
        driver.link_mut().queue_packet(&[0x11; 21]);

        let received = driver.poll_for_packet().unwrap().expect("packet");
        assert_eq!(received.data.len(), 16);
        assert!(driver.link().fifo_is_empty());
    }

    #[test]
    fn test_bus_fault_during_drain_still_rearms() {
        let mut driver = ready_driver();
        driver.link_mut().queue_packet(&[0x11; 21]);
        driver.link_mut().fail_on_fifo_read();

        let result = driver.poll_for_packet();
        assert!(matches!(result, Err(CommError::BusFault { .. })));
        assert_eq!(driver.link().strobes(), &[SIDLE, SFRX, SRX]);
        assert_eq!(driver.status().state, ReceiveState::Listening);
    }

    #[test]
    fn test_invalid_config() {
        let config = TransceiverConfig { max_packet_len: 81, ..Default::default() };
        assert!(TransceiverDriver::new(MockChip::new(), NoDelay::default(), config).is_err());

        let config = TransceiverConfig { settle_delay_ms: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rssi_conversion() {
        assert_eq!(rssi_to_dbm(0x00), -74);
        assert_eq!(rssi_to_dbm(0x20), -58);
        assert_eq!(rssi_to_dbm(0xC0), -106);
    }
}
