//! Weather-station frame decoding
//!
//! Frame layout (big-endian multi-byte fields):
//!
//! ```text
//! [family][id x3][status][temp hi|lo][humidity][dir x2][speed][gust][rain x3][uv]([lux x4])[crc]
//! ```

use crate::core::{
    monotonic_ms, WeatherReading, WEATHER_BATTERY_LOW_FLAG, WEATHER_EXTENDED_FRAME_LEN,
    WEATHER_FAMILY_CODE, WEATHER_MIN_FRAME_LEN, WEATHER_TEMPERATURE_OFFSET, WIND_DIRECTION_MAX_DEG,
};
use crate::processing::checksum::crc8;
use log::warn;
use std::fmt;

/// tenths of m/s -> km/h
const WIND_TENTHS_MS_TO_KMH: f32 = 0.36;

/// Why a buffer did not produce a reading
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    TooShort { required: usize, available: usize },
    ChecksumMismatch { computed: u8, received: u8 },
    /// Only raised when strict family checking is enabled
    UnexpectedFamily { expected: u8, received: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TooShort { required, available } => {
                write!(f, "Frame too short: need {} bytes, got {}", required, available)
            }
            DecodeError::ChecksumMismatch { computed, received } => {
                write!(f, "CRC mismatch: computed 0x{:02X}, frame carries 0x{:02X}", computed, received)
            }
            DecodeError::UnexpectedFamily { expected, received } => {
                write!(f, "Unexpected family code 0x{:02X} (expected 0x{:02X})", received, expected)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Turns a raw radio packet into a [`WeatherReading`].
///
/// The CRC is the only check that can reject a frame by default. A wrong
/// family byte is logged and the frame decoded anyway, since compatible
/// transmitters share the layout; `strict_family` turns that into a
/// rejection.
#[derive(Debug, Clone)]
pub struct WeatherFrameDecoder {
    family_code: u8,
    strict_family: bool,
}

impl Default for WeatherFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherFrameDecoder {
    pub fn new() -> Self {
        Self {
            family_code: WEATHER_FAMILY_CODE,
            strict_family: false,
        }
    }

    pub fn with_family_code(mut self, family_code: u8) -> Self {
        self.family_code = family_code;
        self
    }

    pub fn set_strict_family(&mut self, strict: bool) {
        self.strict_family = strict;
    }

    /// Decode and stamp with the current monotonic time
    pub fn decode(&self, bytes: &[u8]) -> Result<WeatherReading, DecodeError> {
        self.decode_at(bytes, monotonic_ms())
    }

    /// Decode and stamp with `captured_at_ms`
    pub fn decode_at(&self, bytes: &[u8], captured_at_ms: u64) -> Result<WeatherReading, DecodeError> {
        if bytes.len() < WEATHER_MIN_FRAME_LEN {
            return Err(DecodeError::TooShort {
                required: WEATHER_MIN_FRAME_LEN,
                available: bytes.len(),
            });
        }

        let (body, crc) = bytes.split_at(bytes.len() - 1);
        let computed = crc8(body);
        if computed != crc[0] {
            return Err(DecodeError::ChecksumMismatch {
                computed,
                received: crc[0],
            });
        }

        if body[0] != self.family_code {
            if self.strict_family {
                return Err(DecodeError::UnexpectedFamily {
                    expected: self.family_code,
                    received: body[0],
                });
            }
            warn!(
                "Family code 0x{:02X} does not match 0x{:02X}, decoding anyway",
                body[0], self.family_code
            );
        }

        Ok(extract_fields(bytes, captured_at_ms))
    }
}

/// Field extraction from a CRC-checked buffer of at least the minimum length
fn extract_fields(b: &[u8], captured_at_ms: u64) -> WeatherReading {
    let station_id = u32::from_be_bytes([0, b[1], b[2], b[3]]);
    let battery_ok = b[4] & WEATHER_BATTERY_LOW_FLAG == 0;

    let raw_temperature = (((b[5] & 0x0F) as i32) << 8) | b[6] as i32;
    let temperature_c = (raw_temperature - WEATHER_TEMPERATURE_OFFSET) as f32 / 10.0;

    let mut wind_direction_deg = u16::from_be_bytes([b[8], b[9]]);
    if wind_direction_deg > WIND_DIRECTION_MAX_DEG {
        wind_direction_deg = 0;
    }

    let rain_raw = u32::from_be_bytes([0, b[12], b[13], b[14]]);

    let illuminance_lux = if b.len() >= WEATHER_EXTENDED_FRAME_LEN {
        u32::from_be_bytes([b[16], b[17], b[18], b[19]])
    } else {
        0
    };

    WeatherReading {
        station_id,
        temperature_c,
        humidity_pct: b[7],
        wind_direction_deg,
        wind_speed_kmh: b[10] as f32 * WIND_TENTHS_MS_TO_KMH,
        wind_gust_kmh: b[11] as f32 * WIND_TENTHS_MS_TO_KMH,
        rain_accumulation_mm: rain_raw as f32 / 10.0,
        uv_index: b[15],
        illuminance_lux,
        battery_ok,
        captured_at_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::SimulatedWeather;

    const REFERENCE_FRAME: [u8; 21] = [
        0x24, 0x12, 0x34, 0x56, 0x00, 0x01, 0x94, 0x32, 0x00, 0x2D, 0x0A, 0x14, 0x00, 0x00, 0x64,
        0x05, 0x00, 0x00, 0x01, 0x2C, 0x80,
    ];

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_reference_frame() {
        let reading = WeatherFrameDecoder::new().decode_at(&REFERENCE_FRAME, 42).unwrap();

        assert_eq!(reading.station_id, 0x123456);
        assert!(reading.battery_ok);
        assert!(approx(reading.temperature_c, 0.4));
        assert_eq!(reading.humidity_pct, 50);
        assert_eq!(reading.wind_direction_deg, 45);
        assert!(approx(reading.wind_speed_kmh, 3.6));
        assert!(approx(reading.wind_gust_kmh, 7.2));
        assert!(approx(reading.rain_accumulation_mm, 10.0));
        assert_eq!(reading.uv_index, 5);
        assert_eq!(reading.illuminance_lux, 300);
        assert_eq!(reading.captured_at_ms, 42);
    }

    #[test]
    fn test_any_single_byte_change_is_rejected() {
        let decoder = WeatherFrameDecoder::new();
        for index in 0..REFERENCE_FRAME.len() {
            for flip in [0x01u8, 0x10, 0x80, 0xFF] {
                let mut frame = REFERENCE_FRAME;
                frame[index] ^= flip;
                assert!(
                    matches!(decoder.decode_at(&frame, 0), Err(DecodeError::ChecksumMismatch { .. })),
                    "byte {} xor 0x{:02X} was accepted",
                    index,
                    flip
                );
            }
        }
    }

    #[test]
    fn test_too_short() {
        let decoder = WeatherFrameDecoder::new();
        assert_eq!(
            decoder.decode_at(&REFERENCE_FRAME[..16], 0),
            Err(DecodeError::TooShort { required: 17, available: 16 })
        );
        assert!(matches!(decoder.decode_at(&[], 0), Err(DecodeError::TooShort { .. })));
    }

    #[test]
    fn test_core_frame_has_no_illuminance() {
        let frame = SimulatedWeather { illuminance: None, ..Default::default() }.to_frame();
        assert_eq!(frame.len(), WEATHER_MIN_FRAME_LEN);

        let reading = WeatherFrameDecoder::new().decode_at(&frame, 0).unwrap();
        assert_eq!(reading.illuminance_lux, 0);
        assert_eq!(reading.uv_index, 5);
    }

    #[test]
    fn test_temperature_conversion() {
        let decoder = WeatherFrameDecoder::new();
        for (raw, expected) in [(400u16, 0.0f32), (650, 25.0), (0, -40.0), (1000, 60.0), (395, -0.5)] {
            let frame = SimulatedWeather { raw_temperature: raw, ..Default::default() }.to_frame();
            let reading = decoder.decode_at(&frame, 0).unwrap();
            assert!(approx(reading.temperature_c, expected), "raw {} -> {}", raw, reading.temperature_c);
        }
    }

    #[test]
    fn test_temperature_ignores_upper_nibble() {
        let mut frame = SimulatedWeather { raw_temperature: 650, ..Default::default() }.to_frame();
        frame[5] |= 0xF0;
        let last = frame.len() - 1;
        frame[last] = crc8(&frame[..last]);

        let reading = WeatherFrameDecoder::new().decode_at(&frame, 0).unwrap();
        assert!(approx(reading.temperature_c, 25.0));
    }

    #[test]
    fn test_wind_direction_clamp() {
        let decoder = WeatherFrameDecoder::new();
        for (raw, expected) in [(0u16, 0u16), (180, 180), (360, 360), (361, 0), (1000, 0), (u16::MAX, 0)] {
            let frame = SimulatedWeather { wind_direction_deg: raw, ..Default::default() }.to_frame();
            assert_eq!(decoder.decode_at(&frame, 0).unwrap().wind_direction_deg, expected);
        }
    }

    #[test]
    fn test_battery_flag_is_inverted() {
        let decoder = WeatherFrameDecoder::new();
        let low = SimulatedWeather { battery_low: true, ..Default::default() }.to_frame();
        assert!(!decoder.decode_at(&low, 0).unwrap().battery_ok);

        let ok = SimulatedWeather { battery_low: false, ..Default::default() }.to_frame();
        assert!(decoder.decode_at(&ok, 0).unwrap().battery_ok);
    }

    #[test]
    fn test_large_rain_counter() {
        let frame = SimulatedWeather { rain_raw: 0xFFFFFF, ..Default::default() }.to_frame();
        let reading = WeatherFrameDecoder::new().decode_at(&frame, 0).unwrap();
        assert!(approx(reading.rain_accumulation_mm, 1_677_721.5));
    }

    #[test]
    fn test_foreign_family_is_decoded_unless_strict() {
        let frame = SimulatedWeather { family: 0x65, ..Default::default() }.to_frame();

        let mut decoder = WeatherFrameDecoder::new();
        assert!(decoder.decode_at(&frame, 0).is_ok());

        decoder.set_strict_family(true);
        assert_eq!(
            decoder.decode_at(&frame, 0),
            Err(DecodeError::UnexpectedFamily { expected: 0x24, received: 0x65 })
        );
    }

    #[test]
    fn test_custom_family_code() {
        let frame = SimulatedWeather { family: 0x65, ..Default::default() }.to_frame();

        let mut decoder = WeatherFrameDecoder::new().with_family_code(0x65);
        decoder.set_strict_family(true);
        assert_eq!(decoder.decode_at(&frame, 0).unwrap().humidity_pct, 50);
        assert_eq!(
            decoder.decode_at(&REFERENCE_FRAME, 0),
            Err(DecodeError::UnexpectedFamily { expected: 0x65, received: 0x24 })
        );
    }

    #[test]
    fn test_decode_is_deterministic() {
        let decoder = WeatherFrameDecoder::new();
        let first = decoder.decode(&REFERENCE_FRAME).unwrap();
        let second = decoder.decode(&REFERENCE_FRAME).unwrap();
        assert_eq!(first.clone().with_timestamp(0), second.with_timestamp(0));
    }

    #[test]
    fn test_trailing_padding_from_fixed_length_packet() {
        // A fixed-length radio packet may carry more bytes than the frame;
        // the CRC still covers everything before the final byte.
        let mut frame = REFERENCE_FRAME[..20].to_vec();
        frame.extend_from_slice(&[0x00; 5]);
        frame.push(crc8(&frame));

        let reading = WeatherFrameDecoder::new().decode_at(&frame, 0).unwrap();
        assert_eq!(reading.illuminance_lux, 300);
    }
}
