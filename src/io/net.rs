//! Deadline support for std sockets.
//!
//! std sockets only expose relative timeouts, so each absolute deadline is
//! turned into the time remaining until it. Impls exist for both the owned
//! stream and a shared reference, which lets one socket be read by one
//! thread and written by another during a splice.

use super::{DeadlineRead, DeadlineWrite};
use std::io::Result;
use std::net::TcpStream;
use std::time::{Duration, Instant};

// A zero timeout is rejected by std, and would mean "block forever" anyway.
const MIN_TIMEOUT: Duration = Duration::from_micros(1);

pub(crate) fn timeout_until(deadline: Instant) -> Duration {
    deadline
        .saturating_duration_since(Instant::now())
        .max(MIN_TIMEOUT)
}

macro_rules! impl_socket_deadlines {
    ($stream:ty) => {
        impl DeadlineRead for $stream {
            fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
                self.set_read_timeout(Some(timeout_until(deadline)))
            }
        }

        impl DeadlineWrite for $stream {
            fn set_write_deadline(&mut self, deadline: Instant) -> Result<()> {
                self.set_write_timeout(Some(timeout_until(deadline)))
            }
        }

        impl DeadlineRead for &$stream {
            fn set_read_deadline(&mut self, deadline: Instant) -> Result<()> {
                self.set_read_timeout(Some(timeout_until(deadline)))
            }
        }

        impl DeadlineWrite for &$stream {
            fn set_write_deadline(&mut self, deadline: Instant) -> Result<()> {
                self.set_write_timeout(Some(timeout_until(deadline)))
            }
        }
    };
}

impl_socket_deadlines!(TcpStream);
#[cfg(unix)]
impl_socket_deadlines!(std::os::unix::net::UnixStream);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::error::is_timeout;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn past_deadline_clamps_to_minimum() {
        let past = Instant::now() - Duration::from_secs(1);
        assert_eq!(timeout_until(past), MIN_TIMEOUT);
        let future = Instant::now() + Duration::from_secs(5);
        assert!(timeout_until(future) > Duration::from_secs(4));
    }

    #[test]
    fn read_deadline_times_out() {
        let (mut client, _server) = tcp_pair();
        client
            .set_read_deadline(Instant::now() + Duration::from_millis(20))
            .unwrap();
        let started = Instant::now();
        let mut buf = [0u8; 16];
        let err = client.read(&mut buf).unwrap_err();
        assert!(is_timeout(&err), "unexpected error: {err}");
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn shared_reference_reads_and_writes() {
        let (client, server) = tcp_pair();
        let mut writer = &client;
        writer
            .set_write_deadline(Instant::now() + Duration::from_secs(1))
            .unwrap();
        writer.write_all(b"ping").unwrap();

        let mut reader = &server;
        reader
            .set_read_deadline(Instant::now() + Duration::from_secs(1))
            .unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[cfg(unix)]
    #[test]
    fn unix_stream_deadlines() {
        use std::os::unix::net::UnixStream;
        let (mut a, mut b) = UnixStream::pair().unwrap();
        a.set_write_deadline(Instant::now() + Duration::from_secs(1))
            .unwrap();
        a.write_all(b"x").unwrap();
        b.set_read_deadline(Instant::now() + Duration::from_millis(50))
            .unwrap();
        let mut buf = [0u8; 1];
        b.read_exact(&mut buf).unwrap();
        let err = b.read(&mut buf).unwrap_err();
        assert!(is_timeout(&err));
    }
}
