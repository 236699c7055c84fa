//! Hardware error types and recovery hints

use std::fmt;

/// Errors raised while talking to the transceiver or a UART source
#[derive(Debug, Clone, PartialEq)]
pub enum CommError {
    /// Presence check read something other than the documented reset value
    ChipNotDetected { register: u8, expected: u8, received: u8 },
    /// The underlying link failed mid-transaction
    BusFault { operation: String, details: String },
    /// Buffer too small or too large for the requested transfer
    BufferError { operation: String },
    /// Configuration error
    ConfigurationError { parameter: String, value: String },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommError::ChipNotDetected { register, expected, received } => {
                write!(
                    f,
                    "Chip not detected: register 0x{:02X} read 0x{:02X}, expected 0x{:02X}",
                    register, received, expected
                )
            }
            CommError::BusFault { operation, details } => {
                write!(f, "Bus fault during {}: {}", operation, details)
            }
            CommError::BufferError { operation } => {
                write!(f, "Buffer error during {}", operation)
            }
            CommError::ConfigurationError { parameter, value } => {
                write!(f, "Configuration error: invalid {} = {}", parameter, value)
            }
        }
    }
}

impl std::error::Error for CommError {}

/// Result type for hardware operations
pub type CommResult<T> = Result<T, CommError>;

/// What the polling cycle should do after a hardware error
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryStrategy {
    /// Drop this cycle and poll again next time
    Skip,
    /// Keep running without this sensor, probing again later
    Degrade,
    /// Fail permanently
    Fail,
}

impl CommError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            CommError::ChipNotDetected { .. } => RecoveryStrategy::Degrade,
            CommError::BusFault { .. } => RecoveryStrategy::Skip,
            CommError::BufferError { .. } => RecoveryStrategy::Skip,
            CommError::ConfigurationError { .. } => RecoveryStrategy::Fail,
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.recovery_strategy(), RecoveryStrategy::Fail)
    }
}
