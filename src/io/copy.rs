use super::error::{CopyError, CopyErrorKind, is_closed, is_timeout};
use super::{DeadlineRead, DeadlineWrite};
use crate::config::{CopyParams, DEFAULT_BUFFER_SIZE, DEFAULT_POLL_INTERVAL};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Copy operation builder for deadline-capable blocking streams with support for:
/// - Cancellation through a `CancellationToken`, observed every poll interval
/// - Read idle timeout
/// - Buffer size and poll interval configuration
/// - Real-time statistics callbacks
///
/// Every read and write is bounded by a deadline one poll interval away, so
/// the loop never blocks longer than that before re-checking cancellation.
pub struct CopyOperation<'a, R: ?Sized, W: ?Sized> {
    src: &'a mut R,
    dst: &'a mut W,
    buffer_size: usize,
    poll_interval: Duration,
    read_timeout: Option<Duration>,
    stats_callback: Option<Box<dyn FnMut(usize) + Send + 'a>>,
}

impl<'a, R, W> CopyOperation<'a, R, W>
where
    R: DeadlineRead + ?Sized,
    W: DeadlineWrite + ?Sized,
{
    pub fn new(src: &'a mut R, dst: &'a mut W) -> Self {
        Self {
            src,
            dst,
            buffer_size: DEFAULT_BUFFER_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: None,
            stats_callback: None,
        }
    }

    /// Fail if no data arrives for this long
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set buffer size for copy operations
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Configure from CopyParams (buffer size, poll interval and read timeout)
    pub fn with_params(self, params: &CopyParams) -> Self {
        self.buffer_size(params.buffer_size)
            .poll_interval(params.poll_interval)
            .read_timeout(params.read_timeout)
    }

    /// Set statistics callback, called with the size of every accepted write
    pub fn with_stats<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize) + Send + 'a,
    {
        self.stats_callback = Some(Box::new(callback));
        self
    }

    /// Run the copy until the source is exhausted or closed.
    ///
    /// Returns the number of bytes the destination accepted. On failure the
    /// same count is available from [`CopyError::written`].
    pub fn execute(mut self, cancel: &CancellationToken) -> Result<u64, CopyError> {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut written = 0u64;
        let mut last_read = Instant::now();

        loop {
            if cancel.is_cancelled() {
                debug!(written, "copy cancelled");
                return Err(CopyError::new(written, CopyErrorKind::Cancelled));
            }

            if let Some(timeout) = self.read_timeout
                && last_read.elapsed() >= timeout
            {
                debug!(written, ?timeout, "copy read idle timeout");
                return Err(CopyError::new(
                    written,
                    CopyErrorKind::ReadIdleTimeout(timeout),
                ));
            }

            if let Err(e) = self.src.set_read_deadline(Instant::now() + self.poll_interval) {
                if is_closed(&e) {
                    debug!(written, "source closed");
                    break;
                }
                return Err(CopyError::new(written, CopyErrorKind::SetReadDeadline(e)));
            }

            let nr = match self.src.read(&mut buffer) {
                Ok(0) => {
                    debug!(written, "source reached EOF");
                    break;
                }
                Ok(n) => n,
                Err(e) if is_closed(&e) => {
                    debug!(written, "source closed: {}", e);
                    break;
                }
                Err(e) if is_timeout(&e) || e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(written, "read failed: {}", e);
                    return Err(CopyError::new(written, CopyErrorKind::Read(e)));
                }
            };
            last_read = Instant::now();
            trace!(nr, "read chunk");

            let mut offset = 0;
            while offset < nr {
                if cancel.is_cancelled() {
                    debug!(written, pending = nr - offset, "copy cancelled while draining");
                    return Err(CopyError::new(written, CopyErrorKind::Cancelled));
                }

                if let Err(e) = self
                    .dst
                    .set_write_deadline(Instant::now() + self.poll_interval)
                {
                    return Err(CopyError::new(written, CopyErrorKind::SetWriteDeadline(e)));
                }

                match self.dst.write(&buffer[offset..nr]) {
                    Ok(0) => {
                        let e = IoError::from(IoErrorKind::WriteZero);
                        return Err(CopyError::new(written, CopyErrorKind::Write(e)));
                    }
                    Ok(nw) => {
                        offset += nw;
                        written += nw as u64;
                        if let Some(ref mut callback) = self.stats_callback {
                            callback(nw);
                        }
                    }
                    // Nothing was accepted, retry the same bytes
                    Err(e) if is_timeout(&e) || e.kind() == IoErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!(written, "write failed: {}", e);
                        return Err(CopyError::new(written, CopyErrorKind::Write(e)));
                    }
                }
            }
        }

        Ok(written)
    }
}

/// Copy `src` into `dst` until `src` is exhausted, `cancel` fires, or no data
/// arrives within `read_timeout`.
pub fn copy<W, R>(
    cancel: &CancellationToken,
    dst: &mut W,
    src: &mut R,
    read_timeout: Option<Duration>,
) -> Result<u64, CopyError>
where
    W: DeadlineWrite + ?Sized,
    R: DeadlineRead + ?Sized,
{
    CopyOperation::new(src, dst)
        .read_timeout(read_timeout)
        .execute(cancel)
}
