//! Cooperative cancellation shared by every collaborator call.
//!
//! One token is created per process and cancelled on interrupt. Anything that
//! blocks (network, child processes, poll sleeps) races against it.

use std::future::Future;

use thiserror::Error;

pub use tokio_util::sync::CancellationToken;

/// Returned when an operation is abandoned because the token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Run `fut` unless `cancel` fires first.
pub async fn with_cancel<T, F>(cancel: &CancellationToken, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }

    tokio::select! {
        _ = cancel.cancelled() => Err(Cancelled.into()),
        result = fut => result,
    }
}

/// Returns true if `err` (or anything in its chain) is a [`Cancelled`].
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Cancelled>())
}
