//! Frame decoding for both sensor paths

pub mod checksum;
pub mod weather;
pub mod particulate;

pub use checksum::{additive_checksum16, crc8};
pub use weather::{DecodeError, WeatherFrameDecoder};
pub use particulate::{FrameError, ParticulateFrameSync, SyncState};
