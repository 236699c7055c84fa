//! Protocol constants shared by the radio and UART paths

/// Largest packet the radio path will ever hand to the decoder (bytes)
pub const MAX_PACKET_LEN: usize = 80;

/// Family code carried in the first byte of a weather frame
pub const WEATHER_FAMILY_CODE: u8 = 0x24;

/// Core weather fields plus the trailing CRC byte
pub const WEATHER_MIN_FRAME_LEN: usize = 17;

/// Core fields, the 4-byte illuminance field and the CRC byte
pub const WEATHER_EXTENDED_FRAME_LEN: usize = 21;

/// Status bit that is set when the transmitter battery is low
pub const WEATHER_BATTERY_LOW_FLAG: u8 = 0x08;

/// Raw temperature offset; the transmitter encodes `(C * 10) + 400`
pub const WEATHER_TEMPERATURE_OFFSET: i32 = 400;

/// Wind directions above this are out of range and reported as 0
pub const WIND_DIRECTION_MAX_DEG: u16 = 360;

/// Fixed particulate frame size, header and checksum included
pub const PMS_FRAME_LEN: usize = 32;

/// Two-byte start-of-frame marker on the particulate UART
pub const PMS_HEADER: [u8; 2] = [0x42, 0x4D];

/// Bytes covered by the additive checksum (everything but the checksum itself)
pub const PMS_CHECKSUM_SPAN: usize = PMS_FRAME_LEN - 2;

/// Default wait between seeing the first FIFO bytes and draining the packet
pub const PACKET_SETTLE_DELAY_MS: u32 = 10;
