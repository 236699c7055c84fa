//! Latest-known-good readings
//!
//! The store trusts its callers: only decoders hand it readings, and they
//! only produce checksum-valid ones. A failed decode simply leaves the
//! previous reading in place. Single-owner by design; wrap it in a mutex
//! before sharing it across threads.

use crate::core::{monotonic_ms, ParticulateReading, Timestamped, WeatherReading};
use serde::Serialize;

/// Holds at most one weather and one particulate reading
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    weather: Option<WeatherReading>,
    particulate: Option<ParticulateReading>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weather(&mut self, reading: WeatherReading) {
        self.weather = Some(reading);
    }

    pub fn set_particulate(&mut self, reading: ParticulateReading) {
        self.particulate = Some(reading);
    }

    pub fn current_weather(&self) -> Option<&WeatherReading> {
        self.weather.as_ref()
    }

    pub fn current_particulate(&self) -> Option<&ParticulateReading> {
        self.particulate.as_ref()
    }

    /// Milliseconds since `reading` was captured
    pub fn age_ms_of<T: Timestamped>(&self, reading: &T) -> u64 {
        age_ms_at(reading, monotonic_ms())
    }

    /// Dashboard view of both readings as of `now_ms`
    pub fn snapshot(&self, now_ms: u64) -> ReadingsSnapshot {
        ReadingsSnapshot {
            weather: self.weather.as_ref().map(|w| WeatherSnapshot::new(w, now_ms)),
            particulate: self.particulate.as_ref().map(|p| ParticulateSnapshot::new(p, now_ms)),
        }
    }
}

/// Age of `reading` relative to `now_ms`; zero if the clock reads earlier
pub fn age_ms_at<T: Timestamped>(reading: &T, now_ms: u64) -> u64 {
    now_ms.saturating_sub(reading.captured_at_ms())
}

/// JSON shape served to the dashboard and republished upstream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingsSnapshot {
    pub weather: Option<WeatherSnapshot>,
    pub particulate: Option<ParticulateSnapshot>,
}

impl ReadingsSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub temperature: f32,
    pub humidity: u8,
    pub wind_direction: u16,
    pub wind_speed: f32,
    pub wind_gust: f32,
    pub rain: f32,
    pub uv: u8,
    pub illuminance: u32,
    pub battery_ok: bool,
    pub age_seconds: u64,
}

impl WeatherSnapshot {
    fn new(reading: &WeatherReading, now_ms: u64) -> Self {
        Self {
            temperature: reading.temperature_c,
            humidity: reading.humidity_pct,
            wind_direction: reading.wind_direction_deg,
            wind_speed: reading.wind_speed_kmh,
            wind_gust: reading.wind_gust_kmh,
            rain: reading.rain_accumulation_mm,
            uv: reading.uv_index,
            illuminance: reading.illuminance_lux,
            battery_ok: reading.battery_ok,
            age_seconds: age_ms_at(reading, now_ms) / 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticulateSnapshot {
    pub pm1_0: u16,
    pub pm2_5: u16,
    pub pm10: u16,
    pub particles_0_3um: u16,
    pub particles_0_5um: u16,
    pub particles_1_0um: u16,
    pub particles_2_5um: u16,
    pub particles_5_0um: u16,
    pub particles_10um: u16,
    pub age_seconds: u64,
}

impl ParticulateSnapshot {
    fn new(reading: &ParticulateReading, now_ms: u64) -> Self {
        let mass = &reading.mass_concentration;
        let counts = &reading.particle_counts;
        Self {
            pm1_0: mass.pm1_0,
            pm2_5: mass.pm2_5,
            pm10: mass.pm10,
            particles_0_3um: counts.gt0_3um,
            particles_0_5um: counts.gt0_5um,
            particles_1_0um: counts.gt1_0um,
            particles_2_5um: counts.gt2_5um,
            particles_5_0um: counts.gt5_0um,
            particles_10um: counts.gt10um,
            age_seconds: age_ms_at(reading, now_ms) / 1000,
        }
    }
}
