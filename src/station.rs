//! The polling cycle
//!
//! One [`Station::poll_once`] call checks the radio for a packet, feeds any
//! new UART bytes to the particulate framer and records whatever decoded
//! successfully. Nothing in here is fatal: failures become "no new reading
//! this cycle" and the previous readings stay in the store.

use crate::hardware::{ByteSource, ChipSelectLink, CommError, Delay, RecoveryStrategy, TransceiverDriver};
use crate::processing::{ParticulateFrameSync, WeatherFrameDecoder};
use crate::store::ReadingStore;
use crate::utils::StationConfig;
use log::{debug, info, trace, warn};

/// What a single cycle produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub weather_updated: bool,
    pub particulate_frames: usize,
}

/// Running counters since start-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationStats {
    pub cycles: u64,
    pub weather_decoded: u64,
    pub weather_rejected: u64,
    pub particulate_decoded: u64,
    pub radio_errors: u64,
    pub uart_errors: u64,
}

pub struct Station<L, D, S> {
    radio: TransceiverDriver<L, D>,
    uart: S,
    decoder: WeatherFrameDecoder,
    framer: ParticulateFrameSync,
    store: ReadingStore,
    radio_online: bool,
    reinit_interval_cycles: u32,
    cycles_since_check: u32,
    read_buffer: Vec<u8>,
    stats: StationStats,
}

impl<L: ChipSelectLink, D: Delay, S: ByteSource> Station<L, D, S> {
    pub fn new(radio: TransceiverDriver<L, D>, uart: S, config: &StationConfig) -> Self {
        let mut decoder = WeatherFrameDecoder::new();
        decoder.set_strict_family(config.radio.strict_family_check);

        Self {
            radio,
            uart,
            decoder,
            framer: ParticulateFrameSync::new(),
            store: ReadingStore::new(),
            radio_online: false,
            reinit_interval_cycles: config.radio.reinit_interval_cycles,
            cycles_since_check: 0,
            read_buffer: vec![0; config.particulate.read_chunk_size],
            stats: StationStats::default(),
        }
    }

    /// Bring the radio up. Returns whether it is online; the UART path runs
    /// either way.
    pub fn start(&mut self) -> Result<bool, CommError> {
        self.try_bring_up_radio()?;
        Ok(self.radio_online)
    }

    /// Run one polling cycle
    pub fn poll_once(&mut self) -> CycleReport {
        self.stats.cycles += 1;
        let mut report = CycleReport::default();

        if self.radio_online {
            report.weather_updated = self.poll_radio();
        } else {
            self.maybe_recheck_radio();
        }

        report.particulate_frames = self.poll_uart();
        report
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }

    pub fn radio(&self) -> &TransceiverDriver<L, D> {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut TransceiverDriver<L, D> {
        &mut self.radio
    }

    pub fn uart_mut(&mut self) -> &mut S {
        &mut self.uart
    }

    pub fn framer(&self) -> &ParticulateFrameSync {
        &self.framer
    }

    pub fn is_radio_online(&self) -> bool {
        self.radio_online
    }

    fn try_bring_up_radio(&mut self) -> Result<(), CommError> {
        self.cycles_since_check = 0;
        match self.radio.initialize() {
            Ok(()) => {
                self.radio_online = true;
                Ok(())
            }
            Err(e) => {
                self.radio_online = false;
                match e.recovery_strategy() {
                    RecoveryStrategy::Fail => Err(e),
                    _ => {
                        warn!("Radio unavailable, continuing without weather data: {}", e);
                        Ok(())
                    }
                }
            }
        }
    }

    fn maybe_recheck_radio(&mut self) {
        if self.reinit_interval_cycles == 0 {
            return;
        }

        self.cycles_since_check += 1;
        if self.cycles_since_check < self.reinit_interval_cycles {
            return;
        }

        debug!("Probing for radio again");
        if let Err(e) = self.try_bring_up_radio() {
            warn!("Radio presence check failed: {}", e);
        } else if self.radio_online {
            info!("Radio came back online");
        }
    }

    fn poll_radio(&mut self) -> bool {
        let packet = match self.radio.poll_for_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => return false,
            Err(e) => {
                self.stats.radio_errors += 1;
                warn!("Radio poll failed: {}", e);
                return false;
            }
        };

        match self.decoder.decode(&packet.data) {
            Ok(reading) => {
                trace!(
                    "Weather frame from {:06X}, rssi {:?} dBm",
                    reading.station_id,
                    packet.rssi_dbm
                );
                self.stats.weather_decoded += 1;
                self.store.set_weather(reading);
                true
            }
            Err(e) => {
                self.stats.weather_rejected += 1;
                debug!("Dropping weather frame: {}", e);
                false
            }
        }
    }

    fn poll_uart(&mut self) -> usize {
        let count = match self.uart.read_available(&mut self.read_buffer) {
            Ok(count) => count,
            Err(e) => {
                self.stats.uart_errors += 1;
                warn!("UART read failed: {}", e);
                return 0;
            }
        };
        if count == 0 {
            return 0;
        }

        let readings = self.framer.feed(&self.read_buffer[..count]);
        let decoded = readings.len();
        if let Some(latest) = readings.into_iter().last() {
            self.store.set_particulate(latest);
        }
        self.stats.particulate_decoded += decoded as u64;
        decoded
    }
}
