//! Register access on top of a [`ChipSelectLink`]

use crate::core::MAX_PACKET_LEN;
use crate::hardware::registers::{BURST_FLAG, READ_FLAG};
use crate::hardware::{ChipSelectLink, CommError, CommResult};

/// Read/write/burst-read primitives for the transceiver's register file.
///
/// The header byte of every frame carries the register address in its low
/// six bits, the read flag in bit 7 and the burst flag in bit 6.
pub struct RegisterBus<L> {
    link: L,
}

impl<L: ChipSelectLink> RegisterBus<L> {
    pub fn new(link: L) -> Self {
        Self { link }
    }

    pub fn write_register(&mut self, address: u8, value: u8) -> CommResult<()> {
        let mut frame = [address, value];
        self.link.exchange(&mut frame)
    }

    pub fn read_register(&mut self, address: u8) -> CommResult<u8> {
        let mut frame = [address | READ_FLAG, 0];
        self.link.exchange(&mut frame)?;
        Ok(frame[1])
    }

    /// Status registers share addresses with strobes and need the burst bit
    pub fn read_status(&mut self, address: u8) -> CommResult<u8> {
        let mut frame = [address | READ_FLAG | BURST_FLAG, 0];
        self.link.exchange(&mut frame)?;
        Ok(frame[1])
    }

    /// Read `buf.len()` consecutive bytes starting at `address`
    pub fn burst_read(&mut self, address: u8, buf: &mut [u8]) -> CommResult<()> {
        if buf.is_empty() || buf.len() > MAX_PACKET_LEN {
            return Err(CommError::BufferError {
                operation: format!("burst_read of {} bytes", buf.len()),
            });
        }

        let mut frame = [0u8; MAX_PACKET_LEN + 1];
        let frame = &mut frame[..buf.len() + 1];
        frame[0] = address | READ_FLAG | BURST_FLAG;
        self.link.exchange(frame)?;
        buf.copy_from_slice(&frame[1..]);
        Ok(())
    }

    /// Issue a command strobe, returning the chip status byte
    pub fn strobe(&mut self, command: u8) -> CommResult<u8> {
        let mut frame = [command];
        self.link.exchange(&mut frame)?;
        Ok(frame[0])
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}
