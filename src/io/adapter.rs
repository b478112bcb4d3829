use super::{DeadlineRead, DeadlineWrite};
use std::io::{Read, Result, Write};
use std::time::Instant;

/// Presents an ordinary reader or writer as a deadline-capable one.
///
/// The deadline setters always succeed and do nothing, so the wrapped
/// resource must never block for long (in-memory buffers, files, etc.).
#[derive(Debug, Default, Clone)]
pub struct NopDeadline<T> {
    inner: T,
}

impl<T> NopDeadline<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

pub fn nop_deadline_reader<R: Read>(reader: R) -> NopDeadline<R> {
    NopDeadline::new(reader)
}

pub fn nop_deadline_writer<W: Write>(writer: W) -> NopDeadline<W> {
    NopDeadline::new(writer)
}

impl<T: Read> Read for NopDeadline<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Write> Write for NopDeadline<T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

impl<T: Read> DeadlineRead for NopDeadline<T> {
    fn set_read_deadline(&mut self, _deadline: Instant) -> Result<()> {
        Ok(())
    }
}

impl<T: Write> DeadlineWrite for NopDeadline<T> {
    fn set_write_deadline(&mut self, _deadline: Instant) -> Result<()> {
        Ok(())
    }
}
