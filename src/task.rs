//! Running the blocking engine from async code.
//!
//! Copy and splice block their calling thread for the whole transfer, so async
//! callers hand them to tokio's blocking pool instead of a runtime worker.

use crate::config::CopyParams;
use crate::io::{
    BidirectionalCopy, CopyError, CopyOperation, DeadlineRead, DeadlineWrite, SpliceTotals,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub fn spawn_copy<W, R>(
    cancel: CancellationToken,
    mut dst: W,
    mut src: R,
    params: CopyParams,
) -> JoinHandle<Result<u64, CopyError>>
where
    W: DeadlineWrite + Send + 'static,
    R: DeadlineRead + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        CopyOperation::new(&mut src, &mut dst)
            .with_params(&params)
            .execute(&cancel)
    })
}

pub fn spawn_splice<A, B>(
    cancel: CancellationToken,
    a: Arc<A>,
    b: Arc<B>,
    params: CopyParams,
) -> JoinHandle<Result<SpliceTotals, CopyError>>
where
    A: Send + Sync + ?Sized + 'static,
    B: Send + Sync + ?Sized + 'static,
    for<'x> &'x A: DeadlineRead + DeadlineWrite,
    for<'x> &'x B: DeadlineRead + DeadlineWrite,
{
    tokio::task::spawn_blocking(move || {
        BidirectionalCopy::new(&*a, &*b)
            .with_params(&params)
            .execute(&cancel)
    })
}
