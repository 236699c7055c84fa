//! UART byte sources for the particulate sensor

use crate::hardware::{CommError, CommResult};
use std::io::{ErrorKind, Read};

/// Incremental byte stream with no guaranteed chunk boundaries
pub trait ByteSource {
    /// Copy whatever has arrived into `buf` and return how many bytes were
    /// written. `Ok(0)` means nothing is available right now.
    fn read_available(&mut self, buf: &mut [u8]) -> CommResult<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_available(&mut self, buf: &mut [u8]) -> CommResult<usize> {
        (**self).read_available(buf)
    }
}

/// Adapts any [`Read`] (a serial device node, a recorded capture file) into
/// a [`ByteSource`]. End of input is reported as "nothing available".
pub struct ReaderSource<R> {
    reader: R,
    bytes_read: u64,
    exhausted: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes_read: 0,
            exhausted: false,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// True once the reader has returned end-of-file
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_available(&mut self, buf: &mut [u8]) -> CommResult<usize> {
        if self.exhausted || buf.is_empty() {
            return Ok(0);
        }

        match self.reader.read(buf) {
            Ok(0) => {
                self.exhausted = true;
                Ok(0)
            }
            Ok(n) => {
                self.bytes_read += n as u64;
                Ok(n)
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::TimedOut) => Ok(0),
            Err(e) => Err(CommError::BusFault {
                operation: "uart read".to_string(),
                details: e.to_string(),
            }),
        }
    }
}
