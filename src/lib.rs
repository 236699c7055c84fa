//! Weather Station Telemetry Receiver
//!
//! Acquires readings from a sub-GHz weather-station transmitter, received
//! through a CC1101-class FSK transceiver, and from a PMS-series particulate
//! sensor on a UART. Raw bytes are framed, checksum-validated and decoded
//! into structured readings held in a [`ReadingStore`].

pub mod core;
pub mod hardware;
pub mod processing;
pub mod store;
pub mod station;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{MassConcentration, ParticleCounts, ParticulateReading, Timestamped, WeatherReading};
pub use hardware::{
    ByteSource, ChipSelectLink, CommError, CommResult, FrequencyBand, RawPacket, RegisterBus,
    TransceiverConfig, TransceiverDriver, TransceiverStatus,
};
pub use processing::{DecodeError, FrameError, ParticulateFrameSync, WeatherFrameDecoder};
pub use station::{CycleReport, Station, StationStats};
pub use store::{ReadingStore, ReadingsSnapshot};
pub use utils::{ConfigError, StationConfig};
