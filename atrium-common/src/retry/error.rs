use thiserror::Error;

/// Returned by a [`RetryStrategy`](super::RetryStrategy) that has no backoff left.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("too many retries")]
pub struct TooManyRetries;

#[derive(Error, Debug)]
pub enum Error<E> {
    /// The strategy gave up. `last` is the failure of the final attempt.
    #[error("too many retries, last error: {last}")]
    TooManyRetries { last: E },
    /// The unit of work failed in a way that is not worth retrying.
    #[error("{0}")]
    Aborted(E),
}

impl<E> Error<E> {
    pub fn into_inner(self) -> E {
        match self {
            Error::TooManyRetries { last } => last,
            Error::Aborted(error) => error,
        }
    }
}

pub type Result<T, E> = core::result::Result<T, Error<E>>;
