use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Why a copy or splice stopped early.
#[derive(Debug, Error)]
pub enum CopyErrorKind {
    #[error("copy operation was cancelled")]
    Cancelled,
    #[error("no data read within {0:?}")]
    ReadIdleTimeout(Duration),
    #[error("failed to set read deadline")]
    SetReadDeadline(#[source] IoError),
    #[error("failed to set write deadline")]
    SetWriteDeadline(#[source] IoError),
    #[error("read from source failed")]
    Read(#[source] IoError),
    #[error("write to destination failed")]
    Write(#[source] IoError),
}

/// A failed copy, together with the bytes the destination accepted before
/// the failure.
#[derive(Debug, Error)]
#[error("{kind} after {written} bytes")]
pub struct CopyError {
    written: u64,
    #[source]
    kind: CopyErrorKind,
}

impl CopyError {
    pub fn new(written: u64, kind: CopyErrorKind) -> Self {
        Self { written, kind }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn kind(&self) -> &CopyErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> CopyErrorKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, CopyErrorKind::Cancelled)
    }

    pub fn is_read_timeout(&self) -> bool {
        matches!(self.kind, CopyErrorKind::ReadIdleTimeout(_))
    }

    /// The underlying transport error, if any.
    pub fn io_error(&self) -> Option<&IoError> {
        match &self.kind {
            CopyErrorKind::SetReadDeadline(e)
            | CopyErrorKind::SetWriteDeadline(e)
            | CopyErrorKind::Read(e)
            | CopyErrorKind::Write(e) => Some(e),
            CopyErrorKind::Cancelled | CopyErrorKind::ReadIdleTimeout(_) => None,
        }
    }

    pub(crate) fn with_written(mut self, written: u64) -> Self {
        self.written = written;
        self
    }
}

/// Cancellation maps to `Interrupted`, which std's `read_exact`, `write_all`
/// and `io::copy` retry. Check [`CopyError::is_cancelled`] before converting
/// if the result is fed back into such a loop.
impl From<CopyError> for IoError {
    fn from(err: CopyError) -> Self {
        let kind = match err.kind() {
            CopyErrorKind::Cancelled => IoErrorKind::Interrupted,
            CopyErrorKind::ReadIdleTimeout(_) => IoErrorKind::TimedOut,
            _ => err.io_error().map_or(IoErrorKind::Other, IoError::kind),
        };
        IoError::new(kind, err)
    }
}

/// The resource behind this error is gone: end of stream, closed pipe or
/// socket, or a terminal device that hung up.
pub fn is_closed(err: &IoError) -> bool {
    if matches!(
        err.kind(),
        IoErrorKind::UnexpectedEof | IoErrorKind::BrokenPipe | IoErrorKind::NotConnected
    ) {
        return true;
    }
    #[cfg(unix)]
    if err.raw_os_error() == Some(libc::EIO) {
        return true;
    }
    false
}

/// A deadline expired. std reports socket timeouts as `WouldBlock` on unix
/// and `TimedOut` on windows.
pub fn is_timeout(err: &IoError) -> bool {
    matches!(err.kind(), IoErrorKind::TimedOut | IoErrorKind::WouldBlock)
}
