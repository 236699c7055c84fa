//! Particulate sensor frame synchronisation
//!
//! The sensor streams fixed 32-byte frames starting with `0x42 0x4D`; the
//! last two bytes are the big-endian 16-bit sum of the first 30. Bytes
//! arrive in arbitrary chunks, so the assembler keeps its position between
//! calls and gives the same result however the stream is split.

use crate::core::{
    monotonic_ms, MassConcentration, ParticleCounts, ParticulateReading, PMS_CHECKSUM_SPAN,
    PMS_FRAME_LEN, PMS_HEADER,
};
use crate::processing::checksum::additive_checksum16;
use log::debug;
use std::fmt;

/// A complete frame that could not be used
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    ChecksumMismatch { computed: u16, received: u16 },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::ChecksumMismatch { computed, received } => write!(
                f,
                "Particulate checksum mismatch: computed 0x{:04X}, frame carries 0x{:04X}",
                computed, received
            ),
        }
    }
}

impl std::error::Error for FrameError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    AwaitingFirstHeaderByte,
    AwaitingSecondHeaderByte,
    /// Number of frame bytes held so far
    Accumulating(usize),
}

/// Byte-stream assembler for particulate frames
#[derive(Debug, Clone)]
pub struct ParticulateFrameSync {
    buffer: [u8; PMS_FRAME_LEN],
    state: SyncState,
    frames_decoded: u32,
    checksum_failures: u32,
}

impl Default for ParticulateFrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticulateFrameSync {
    pub fn new() -> Self {
        Self {
            buffer: [0; PMS_FRAME_LEN],
            state: SyncState::AwaitingFirstHeaderByte,
            frames_decoded: 0,
            checksum_failures: 0,
        }
    }

    /// Feed one byte. Returns `Some` when this byte completed a frame.
    pub fn push_at(&mut self, byte: u8, now_ms: u64) -> Option<Result<ParticulateReading, FrameError>> {
        match self.state {
            SyncState::AwaitingFirstHeaderByte => {
                if byte == PMS_HEADER[0] {
                    self.buffer[0] = byte;
                    self.state = SyncState::AwaitingSecondHeaderByte;
                }
                None
            }
            SyncState::AwaitingSecondHeaderByte => {
                if byte == PMS_HEADER[1] {
                    self.buffer[1] = byte;
                    self.state = SyncState::Accumulating(2);
                } else {
                    self.state = SyncState::AwaitingFirstHeaderByte;
                }
                None
            }
            SyncState::Accumulating(cursor) => {
                self.buffer[cursor] = byte;
                let cursor = cursor + 1;
                if cursor < PMS_FRAME_LEN {
                    self.state = SyncState::Accumulating(cursor);
                    return None;
                }

                self.state = SyncState::AwaitingFirstHeaderByte;
                Some(self.finish_frame(now_ms))
            }
        }
    }

    /// Feed a chunk, returning every valid reading it completed
    pub fn feed_at(&mut self, bytes: &[u8], now_ms: u64) -> Vec<ParticulateReading> {
        let mut readings = Vec::new();
        for &byte in bytes {
            match self.push_at(byte, now_ms) {
                Some(Ok(reading)) => readings.push(reading),
                Some(Err(e)) => debug!("Dropping particulate frame: {}", e),
                None => {}
            }
        }
        readings
    }

    /// [`feed_at`](Self::feed_at) stamped with the current monotonic time
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ParticulateReading> {
        self.feed_at(bytes, monotonic_ms())
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn frames_decoded(&self) -> u32 {
        self.frames_decoded
    }

    pub fn checksum_failures(&self) -> u32 {
        self.checksum_failures
    }

    /// Drop any partial frame
    pub fn reset(&mut self) {
        self.state = SyncState::AwaitingFirstHeaderByte;
    }

    fn finish_frame(&mut self, now_ms: u64) -> Result<ParticulateReading, FrameError> {
        let computed = additive_checksum16(&self.buffer[..PMS_CHECKSUM_SPAN]);
        let received = self.word(PMS_CHECKSUM_SPAN);
        if computed != received {
            self.checksum_failures += 1;
            return Err(FrameError::ChecksumMismatch { computed, received });
        }

        self.frames_decoded += 1;
        Ok(ParticulateReading {
            mass_standard: MassConcentration {
                pm1_0: self.word(4),
                pm2_5: self.word(6),
                pm10: self.word(8),
            },
            mass_concentration: MassConcentration {
                pm1_0: self.word(10),
                pm2_5: self.word(12),
                pm10: self.word(14),
            },
            particle_counts: ParticleCounts {
                gt0_3um: self.word(16),
                gt0_5um: self.word(18),
                gt1_0um: self.word(20),
                gt2_5um: self.word(22),
                gt5_0um: self.word(24),
                gt10um: self.word(26),
            },
            captured_at_ms: now_ms,
        })
    }

    fn word(&self, offset: usize) -> u16 {
        u16::from_be_bytes([self.buffer[offset], self.buffer[offset + 1]])
    }
}
