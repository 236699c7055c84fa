//! Blocking delay seam

use std::time::Duration;

/// Bounded busy-wait used by the transceiver driver
pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Returns immediately; records the total time it was asked to wait
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay {
    pub requested_ms: u64,
}

impl Delay for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.requested_ms += ms as u64;
    }
}
