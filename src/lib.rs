//! deadline-io
//!
//! Cancellable copy and splice for blocking streams that can only be
//! interrupted by read/write deadlines. Each read and write is bounded by a
//! short deadline, turning a `CancellationToken` and an optional read idle
//! timeout into prompt, polled shutdown.

pub mod config;
pub mod io;
pub mod task;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types for convenience
pub use config::CopyParams;
pub use io::{
    BidirectionalCopy, CopyError, CopyErrorKind, CopyOperation, DeadlineRead, DeadlineReadWrite,
    DeadlineWrite, NopDeadline, SpliceTotals, copy, copy_full_duplex, splice,
};
pub use tokio_util::sync::CancellationToken;
