//! Core types and constants for the telemetry receiver

pub mod types;
pub mod constants;
pub mod clock;

pub use types::*;
pub use constants::*;
pub use clock::monotonic_ms;
