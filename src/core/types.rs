//! Validated sensor readings

use serde::{Deserialize, Serialize};

/// Anything carrying the monotonic time it was captured at
pub trait Timestamped {
    fn captured_at_ms(&self) -> u64;
}

/// One decoded weather-station transmission.
///
/// Only built from frames whose CRC-8 matched; see
/// [`crate::processing::WeatherFrameDecoder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// 24-bit transmitter identifier
    pub station_id: u32,
    pub temperature_c: f32,
    pub humidity_pct: u8,
    /// 0..=360, out-of-range values are already clamped to 0
    pub wind_direction_deg: u16,
    pub wind_speed_kmh: f32,
    pub wind_gust_kmh: f32,
    /// Transmitter-side running total, never reset locally
    pub rain_accumulation_mm: f32,
    pub uv_index: u8,
    /// 0 when the frame has no light field
    pub illuminance_lux: u32,
    pub battery_ok: bool,
    pub captured_at_ms: u64,
}

impl WeatherReading {
    /// Same reading with a different capture time
    pub fn with_timestamp(mut self, captured_at_ms: u64) -> Self {
        self.captured_at_ms = captured_at_ms;
        self
    }
}

impl Timestamped for WeatherReading {
    fn captured_at_ms(&self) -> u64 {
        self.captured_at_ms
    }
}

/// PM1.0 / PM2.5 / PM10 in µg/m³
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MassConcentration {
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10: u16,
}

/// Particles per 0.1 L above each size threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleCounts {
    pub gt0_3um: u16,
    pub gt0_5um: u16,
    pub gt1_0um: u16,
    pub gt2_5um: u16,
    pub gt5_0um: u16,
    pub gt10um: u16,
}

/// One checksum-valid particulate frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticulateReading {
    /// Atmospheric-environment calibration channel
    pub mass_concentration: MassConcentration,
    /// Standard-particle (CF=1) calibration channel
    pub mass_standard: MassConcentration,
    pub particle_counts: ParticleCounts,
    pub captured_at_ms: u64,
}

impl Timestamped for ParticulateReading {
    fn captured_at_ms(&self) -> u64 {
        self.captured_at_ms
    }
}
