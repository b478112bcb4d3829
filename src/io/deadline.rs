use std::io::{Read, Result, Write};
use std::time::Instant;

/// A reader whose blocking reads can be bounded by an absolute deadline.
///
/// Once the deadline passes, a pending or subsequent `read` must fail with a
/// timeout error (`TimedOut` or `WouldBlock`) instead of blocking further.
pub trait DeadlineRead: Read {
    fn set_read_deadline(&mut self, deadline: Instant) -> Result<()>;
}

/// A writer whose blocking writes can be bounded by an absolute deadline.
pub trait DeadlineWrite: Write {
    fn set_write_deadline(&mut self, deadline: Instant) -> Result<()>;
}

/// Full duplex endpoint: both halves on the same object.
pub trait DeadlineReadWrite: DeadlineRead + DeadlineWrite {}

impl<T> DeadlineReadWrite for T where T: DeadlineRead + DeadlineWrite + ?Sized {}

impl<T: DeadlineRead + ?Sized> DeadlineRead for &mut T {
    fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
        (**self).set_read_deadline(deadline)
    }
}

impl<T: DeadlineWrite + ?Sized> DeadlineWrite for &mut T {
    fn set_write_deadline(&mut self, deadline: Instant) -> Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

impl<T: DeadlineRead + ?Sized> DeadlineRead for Box<T> {
    fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
        (**self).set_read_deadline(deadline)
    }
}

impl<T: DeadlineWrite + ?Sized> DeadlineWrite for Box<T> {
    fn set_write_deadline(&mut self, deadline: Instant) -> Result<()> {
        (**self).set_write_deadline(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, ErrorKind};

    struct Recorder {
        data: Cursor<Vec<u8>>,
        read_deadline: Option<Instant>,
        write_deadline: Option<Instant>,
        out: Vec<u8>,
    }

    impl Read for Recorder {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.data.read(buf)
        }
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.out.write(buf)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    impl DeadlineRead for Recorder {
        fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
            self.read_deadline = Some(deadline);
            Ok(())
        }
    }

    impl DeadlineWrite for Recorder {
        fn set_write_deadline(&mut self, deadline: Instant) -> Result<()> {
            if self.out.len() > 4 {
                return Err(ErrorKind::BrokenPipe.into());
            }
            self.write_deadline = Some(deadline);
            Ok(())
        }
    }

    fn duplex<T: DeadlineReadWrite + ?Sized>(endpoint: &mut T, at: Instant) -> Result<()> {
        endpoint.set_read_deadline(at)?;
        endpoint.set_write_deadline(at)
    }

    #[test]
    fn forwards_through_references_and_boxes() {
        let at = Instant::now();
        let mut rec = Recorder {
            data: Cursor::new(b"abc".to_vec()),
            read_deadline: None,
            write_deadline: None,
            out: Vec::new(),
        };

        duplex(&mut &mut rec, at).unwrap();
        assert_eq!(rec.read_deadline, Some(at));
        assert_eq!(rec.write_deadline, Some(at));

        let mut boxed: Box<dyn DeadlineReadWrite> = Box::new(rec);
        let mut buf = [0u8; 8];
        assert_eq!(boxed.read(&mut buf).unwrap(), 3);
        boxed.write_all(b"hello").unwrap();
        let err = boxed.set_write_deadline(at).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }
}
