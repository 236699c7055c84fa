//! Runs the polling cycle against a simulated transceiver.
//!
//! The particulate path either replays a recorded UART capture
//! (`particulate.capture_path`) or uses a simulated sensor. Configuration
//! comes from the JSON file named by the first argument or by
//! `WEATHER_TELEMETRY_CONFIG`; without one, defaults are used.

use anyhow::{Context, Result};
use log::{error, info};
use std::collections::VecDeque;
use std::fs::File;
use std::time::Duration;
use weather_telemetry::core::{monotonic_ms, MassConcentration, ParticleCounts};
use weather_telemetry::hardware::mock::{MockChip, SimulatedParticulate, SimulatedWeather};
use weather_telemetry::hardware::{ByteSource, CommResult, ReaderSource, StdDelay};
use weather_telemetry::{Station, StationConfig, TransceiverDriver};

const CONFIG_ENV: &str = "WEATHER_TELEMETRY_CONFIG";
const WEATHER_EVERY_CYCLES: u64 = 16;
const PARTICULATE_EVERY_READS: u64 = 10;
const SNAPSHOT_EVERY_CYCLES: u64 = 50;

/// PMS sensor stand-in: one frame every few reads, dribbled out in small pieces
struct SimulatedSensor {
    reads: u64,
    pending: VecDeque<u8>,
}

impl SimulatedSensor {
    fn new() -> Self {
        Self { reads: 0, pending: VecDeque::new() }
    }
}

impl ByteSource for SimulatedSensor {
    fn read_available(&mut self, buf: &mut [u8]) -> CommResult<usize> {
        self.reads += 1;
        if self.reads % PARTICULATE_EVERY_READS == 0 {
            let base = (self.reads / PARTICULATE_EVERY_READS % 20) as u16;
            let sample = SimulatedParticulate {
                standard: MassConcentration { pm1_0: base + 3, pm2_5: base + 6, pm10: base + 9 },
                atmospheric: MassConcentration { pm1_0: base + 2, pm2_5: base + 5, pm10: base + 8 },
                counts: ParticleCounts {
                    gt0_3um: 900 + base * 10,
                    gt0_5um: 300 + base * 4,
                    gt1_0um: 60 + base,
                    gt2_5um: 6,
                    gt5_0um: 2,
                    gt10um: 1,
                },
            };
            self.pending.extend(sample.to_frame());
        }

        let n = (self.reads as usize % 7 + 3).min(buf.len()).min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().unwrap_or(0);
        }
        Ok(n)
    }
}

fn load_config() -> Result<StationConfig> {
    let path = std::env::args().nth(1).or_else(|| std::env::var(CONFIG_ENV).ok());
    match path {
        Some(path) => {
            let config = StationConfig::from_file(&path)
                .with_context(|| format!("loading configuration from {}", path))?;
            info!("Loaded configuration from {}", path);
            Ok(config)
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(StationConfig::default())
        }
    }
}

fn particulate_source(config: &StationConfig) -> Result<Box<dyn ByteSource>> {
    match &config.particulate.capture_path {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening UART capture {}", path))?;
            info!("Replaying particulate capture {}", path);
            Ok(Box::new(ReaderSource::new(file)))
        }
        None => Ok(Box::new(SimulatedSensor::new())),
    }
}

fn simulated_weather(cycle: u64) -> Vec<u8> {
    let step = cycle / WEATHER_EVERY_CYCLES;
    SimulatedWeather {
        raw_temperature: 580 + (step % 40) as u16,
        humidity_pct: 55 + (step % 10) as u8,
        wind_direction_deg: ((step * 15) % 360) as u16,
        wind_speed_raw: (step % 30) as u8,
        wind_gust_raw: (step % 30) as u8 + 8,
        rain_raw: 1200 + step as u32,
        illuminance: Some(20_000 + (step as u32 % 50) * 100),
        ..Default::default()
    }
    .to_frame()
}

fn run(config: StationConfig) -> Result<()> {
    let radio = TransceiverDriver::new(MockChip::new(), StdDelay, config.radio.transceiver_config())
        .context("creating transceiver driver")?;
    let mut station = Station::new(radio, particulate_source(&config)?, &config);

    if !station.start().context("starting radio")? {
        info!("Running without weather data");
    }

    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        if cycle % WEATHER_EVERY_CYCLES == 0 {
            let mut frame = simulated_weather(cycle);
            // Every fifth transmission arrives damaged
            if (cycle / WEATHER_EVERY_CYCLES) % 5 == 0 {
                frame[6] ^= 0x04;
            }
            station.radio_mut().link_mut().queue_packet(&frame);
        }

        let report = station.poll_once();
        if report.weather_updated {
            if let Some(weather) = station.store().current_weather() {
                info!(
                    "Weather: {:.1} C, {}% RH, wind {:.1} km/h @ {} deg, rain {:.1} mm",
                    weather.temperature_c,
                    weather.humidity_pct,
                    weather.wind_speed_kmh,
                    weather.wind_direction_deg,
                    weather.rain_accumulation_mm
                );
            }
        }
        if report.particulate_frames > 0 {
            if let Some(pm) = station.store().current_particulate() {
                info!(
                    "Particulate: PM1.0 {} PM2.5 {} PM10 {} ug/m3",
                    pm.mass_concentration.pm1_0, pm.mass_concentration.pm2_5, pm.mass_concentration.pm10
                );
            }
        }

        if cycle % SNAPSHOT_EVERY_CYCLES == 0 {
            let snapshot = station.store().snapshot(monotonic_ms());
            println!("{}", snapshot.to_json().context("serializing snapshot")?);
        }

        if config.cycles != 0 && cycle >= config.cycles {
            break;
        }
        std::thread::sleep(Duration::from_millis(config.poll_interval_ms));
    }

    let stats = station.stats();
    info!(
        "Stopped after {} cycles: {} weather frames ({} rejected), {} particulate frames ({} checksum failures)",
        stats.cycles,
        stats.weather_decoded,
        stats.weather_rejected,
        stats.particulate_decoded,
        station.framer().checksum_failures()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };

    run(config)
}
