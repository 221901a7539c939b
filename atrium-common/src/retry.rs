mod error;
mod strategy;

pub use self::error::{Error, Result, TooManyRetries};
pub use self::strategy::{LinearRetryStrategy, RetryStrategy};
use std::future::Future;

/// How a failed attempt should be treated by [`do_with_retry`].
#[derive(Debug)]
pub enum Failure<E> {
    /// Sleep for the next backoff and try again.
    Retry(E),
    /// Stop and return the error.
    Abort(E),
}

/// Runs `unit_of_work` until it succeeds, aborts, or `strategy` is exhausted.
///
/// Attempts are strictly sequential: the next one starts only after the backoff
/// for the previous one has elapsed. Dropping the returned future cancels both
/// the in-flight attempt and any pending sleep.
pub async fn do_with_retry<T, E, F, Fut, S>(mut unit_of_work: F, strategy: &mut S) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = core::result::Result<T, Failure<E>>>,
    S: RetryStrategy + ?Sized,
{
    loop {
        match unit_of_work().await {
            Ok(output) => return Ok(output),
            Err(Failure::Abort(error)) => return Err(Error::Aborted(error)),
            Err(Failure::Retry(error)) => match strategy.next_backoff() {
                Ok(backoff) => {
                    tracing::debug!(?backoff, "attempt failed, retrying after backoff");
                    tokio::time::sleep(backoff).await;
                }
                Err(TooManyRetries) => return Err(Error::TooManyRetries { last: error }),
            },
        }
    }
}
