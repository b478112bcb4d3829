use super::copy::CopyOperation;
use super::error::{CopyError, CopyErrorKind};
use super::{DeadlineRead, DeadlineWrite};
use crate::config::{CopyParams, DEFAULT_BUFFER_SIZE, DEFAULT_POLL_INTERVAL};
use std::panic;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

type StatsCallback<'a> = Box<dyn FnMut(usize) + Send + 'a>;

/// Bytes copied in each direction of a splice.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SpliceTotals {
    pub a_to_b: u64,
    pub b_to_a: u64,
}

impl SpliceTotals {
    pub fn total(&self) -> u64 {
        self.a_to_b + self.b_to_a
    }
}

/// Bidirectional copy operation builder for simultaneous data transfer in both directions
///
/// Each direction runs its own [`CopyOperation`] on a scoped thread. Both share a
/// child of the caller's cancellation token: when either direction stops (EOF,
/// error or cancellation), it waits one grace delay so the other side can notice
/// its own EOF or drain in-flight bytes, then cancels the shared token.
///
/// Endpoints are borrowed; each must be readable and writable through a shared
/// reference (as `&TcpStream` is), since one thread reads it while the other
/// writes it.
pub struct BidirectionalCopy<'a, A: ?Sized, B: ?Sized> {
    stream_a: &'a A,
    stream_b: &'a B,
    buffer_size: usize,
    poll_interval: Duration,
    read_timeout: Option<Duration>,
    grace_delay: Option<Duration>,
    stats_a_to_b: Option<StatsCallback<'a>>,
    stats_b_to_a: Option<StatsCallback<'a>>,
}

impl<'a, A, B> BidirectionalCopy<'a, A, B>
where
    A: Sync + ?Sized,
    B: Sync + ?Sized,
    for<'x> &'x A: DeadlineRead + DeadlineWrite,
    for<'x> &'x B: DeadlineRead + DeadlineWrite,
{
    pub fn new(stream_a: &'a A, stream_b: &'a B) -> Self {
        Self {
            stream_a,
            stream_b,
            buffer_size: DEFAULT_BUFFER_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_timeout: None,
            grace_delay: None,
            stats_a_to_b: None,
            stats_b_to_a: None,
        }
    }

    /// Set buffer size for copy operations
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Fail if either direction goes this long without reading anything
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn grace_delay(mut self, delay: Duration) -> Self {
        self.grace_delay = Some(delay);
        self
    }

    /// Configure from CopyParams
    pub fn with_params(mut self, params: &CopyParams) -> Self {
        self.buffer_size = params.buffer_size;
        self.poll_interval = params.poll_interval;
        self.read_timeout = params.read_timeout;
        self.grace_delay = Some(params.grace_delay());
        self
    }

    /// Set statistics callbacks
    pub fn with_stats<F1, F2>(mut self, stats_a_to_b: F1, stats_b_to_a: F2) -> Self
    where
        F1: FnMut(usize) + Send + 'a,
        F2: FnMut(usize) + Send + 'a,
    {
        self.stats_a_to_b = Some(Box::new(stats_a_to_b));
        self.stats_b_to_a = Some(Box::new(stats_b_to_a));
        self
    }

    /// Execute the bidirectional copy operation
    ///
    /// Cancellation caused by the other direction finishing is not an error.
    /// Otherwise the earliest failure wins, reported with the splice total as
    /// its byte count; if only cancellations occurred and the caller's token
    /// was cancelled, the result is [`CopyErrorKind::Cancelled`].
    pub fn execute(self, cancel: &CancellationToken) -> Result<SpliceTotals, CopyError> {
        let shared = cancel.child_token();
        let direction = Direction {
            cancel: &shared,
            buffer_size: self.buffer_size,
            poll_interval: self.poll_interval,
            read_timeout: self.read_timeout,
            grace_delay: self.grace_delay.unwrap_or(self.poll_interval),
        };
        let (stream_a, stream_b) = (self.stream_a, self.stream_b);
        let (stats_a_to_b, stats_b_to_a) = (self.stats_a_to_b, self.stats_b_to_a);

        let (a_to_b, b_to_a) = thread::scope(|s| {
            let a_to_b = s.spawn(|| direction.run("a->b", stream_a, stream_b, stats_a_to_b));
            let b_to_a = s.spawn(|| direction.run("b->a", stream_b, stream_a, stats_b_to_a));
            (a_to_b.join(), b_to_a.join())
        });
        let a_to_b = a_to_b.unwrap_or_else(|payload| panic::resume_unwind(payload));
        let b_to_a = b_to_a.unwrap_or_else(|payload| panic::resume_unwind(payload));

        let totals = SpliceTotals {
            a_to_b: a_to_b.written(),
            b_to_a: b_to_a.written(),
        };
        debug!(
            a_to_b = totals.a_to_b,
            b_to_a = totals.b_to_a,
            "splice finished"
        );

        let mut failures: Vec<(Instant, CopyError)> = [a_to_b, b_to_a]
            .into_iter()
            .filter_map(|outcome| match outcome.result {
                Ok(_) => None,
                Err(e) => Some((outcome.finished, e)),
            })
            .collect();
        failures.sort_by_key(|(finished, _)| *finished);

        if let Some(pos) = failures.iter().position(|(_, e)| !e.is_cancelled()) {
            let (_, err) = failures.swap_remove(pos);
            return Err(err.with_written(totals.total()));
        }
        if !failures.is_empty() && cancel.is_cancelled() {
            return Err(CopyError::new(totals.total(), CopyErrorKind::Cancelled));
        }
        Ok(totals)
    }
}

struct Direction<'t> {
    cancel: &'t CancellationToken,
    buffer_size: usize,
    poll_interval: Duration,
    read_timeout: Option<Duration>,
    grace_delay: Duration,
}

struct Outcome {
    result: Result<u64, CopyError>,
    finished: Instant,
}

impl Outcome {
    fn written(&self) -> u64 {
        match &self.result {
            Ok(n) => *n,
            Err(e) => e.written(),
        }
    }
}

impl Direction<'_> {
    fn run<R, W>(
        &self,
        name: &'static str,
        mut src: R,
        mut dst: W,
        stats: Option<StatsCallback<'_>>,
    ) -> Outcome
    where
        R: DeadlineRead,
        W: DeadlineWrite,
    {
        // Cancels the shared token on every exit path, panics included
        let _guard = self.cancel.clone().drop_guard();

        let mut op = CopyOperation::new(&mut src, &mut dst)
            .buffer_size(self.buffer_size)
            .poll_interval(self.poll_interval)
            .read_timeout(self.read_timeout);
        if let Some(callback) = stats {
            op = op.with_stats(callback);
        }
        let result = op.execute(self.cancel);
        let finished = Instant::now();

        match &result {
            Ok(n) => debug!(direction = name, written = n, "splice direction completed"),
            Err(e) => debug!(
                direction = name,
                cause = ?e.io_error(),
                "splice direction stopped: {}",
                e
            ),
        }

        if !self.cancel.is_cancelled() {
            thread::sleep(self.grace_delay);
        }
        Outcome { result, finished }
    }
}

/// Copy between `a` and `b` in both directions until one side reaches EOF,
/// an error occurs, `cancel` fires, or a direction idles past `read_timeout`.
///
/// Returns the total bytes written in both directions.
pub fn splice<A, B>(
    cancel: &CancellationToken,
    a: &A,
    b: &B,
    read_timeout: Option<Duration>,
) -> Result<u64, CopyError>
where
    A: Sync + ?Sized,
    B: Sync + ?Sized,
    for<'x> &'x A: DeadlineRead + DeadlineWrite,
    for<'x> &'x B: DeadlineRead + DeadlineWrite,
{
    BidirectionalCopy::new(a, b)
        .read_timeout(read_timeout)
        .execute(cancel)
        .map(|totals| totals.total())
}

/// [`splice`] without a read idle timeout.
pub fn copy_full_duplex<A, B>(cancel: &CancellationToken, a: &A, b: &B) -> Result<u64, CopyError>
where
    A: Sync + ?Sized,
    B: Sync + ?Sized,
    for<'x> &'x A: DeadlineRead + DeadlineWrite,
    for<'x> &'x B: DeadlineRead + DeadlineWrite,
{
    splice(cancel, a, b, None)
}
