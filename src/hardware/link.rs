//! Chip-select framed byte exchange

use crate::hardware::CommResult;

/// Full-duplex byte exchange with chip select held for the whole frame.
///
/// `frame` is clocked out byte by byte and overwritten with the bytes
/// clocked in. One call is one transaction; chip select is released on
/// return, so multi-byte register accesses must go in a single call.
pub trait ChipSelectLink {
    fn exchange(&mut self, frame: &mut [u8]) -> CommResult<()>;
}
