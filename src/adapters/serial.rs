//! Serial transport adapters.
//!
//! - [`WriterTransport`] wraps any `std::io::Write` (a tty device opened
//!   by the binary, stdout, or a `Vec<u8>` in tests).
//! - [`NullTransport`] discards everything; used when no port is configured.

use std::io::Write;

use crate::app::ports::Transport;

/// Transport over any blocking writer.
pub struct WriterTransport<W> {
    inner: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, std::io::Error> {
        self.inner.write(data)
    }

    fn flush(&mut self) -> Result<(), std::io::Error> {
        self.inner.flush()
    }
}

/// A null transport that discards all writes.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
