//! Hardware abstraction layer for the radio transceiver and UART sensor
//!
//! The transceiver sits behind a chip-select framed link
//! ([`ChipSelectLink`]) wrapped by [`RegisterBus`]; the particulate sensor is
//! any [`ByteSource`]. Simulated devices live in [`mock`].

pub mod error;
pub mod link;
pub mod bus;
pub mod registers;
pub mod delay;
pub mod transceiver;
pub mod serial;
pub mod mock;

pub use error::{CommError, CommResult, RecoveryStrategy};
pub use link::ChipSelectLink;
pub use bus::RegisterBus;
pub use registers::FrequencyBand;
pub use delay::{Delay, NoDelay, StdDelay};
pub use transceiver::{ReceiveState, TransceiverConfig, TransceiverDriver, TransceiverStatus};
pub use serial::{ByteSource, ReaderSource};
pub use mock::{MockChip, MockUart};

/// Packet drained from the transceiver FIFO
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    pub data: Vec<u8>,
    pub timestamp_ms: u64,
    pub rssi_dbm: Option<i16>,
}

impl RawPacket {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp_ms: 0, // set by the driver
            rssi_dbm: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_rssi_dbm(mut self, rssi_dbm: i16) -> Self {
        self.rssi_dbm = Some(rssi_dbm);
        self
    }
}
