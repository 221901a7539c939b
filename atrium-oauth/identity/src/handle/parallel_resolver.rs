use super::HandleResolver;
use crate::error::{Error, JoinedErrors, Result};
use crate::types::Did;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_PARALLEL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ParallelHandleResolverConfig {
    /// Shared deadline for the whole race. Zero means [`DEFAULT_PARALLEL_TIMEOUT`].
    pub timeout: Duration,
    pub resolvers: Vec<Arc<dyn HandleResolver + Send + Sync + 'static>>,
}

/// Races a set of [`HandleResolver`]s and returns the first DID any of them finds.
///
/// The outcome is exactly one of:
/// - the first success, after which the remaining attempts are cancelled;
/// - [`Error::Joined`] with every failure, in completion order, if all attempts fail;
/// - [`Error::TimedOut`] if neither happens before the deadline.
///
/// A panicking resolver only fails its own attempt.
pub struct ParallelHandleResolver {
    timeout: Duration,
    resolvers: Vec<Arc<dyn HandleResolver + Send + Sync + 'static>>,
}

impl ParallelHandleResolver {
    pub fn new(config: ParallelHandleResolverConfig) -> Self {
        let timeout =
            if config.timeout.is_zero() { DEFAULT_PARALLEL_TIMEOUT } else { config.timeout };
        Self { timeout, resolvers: config.resolvers }
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl HandleResolver for ParallelHandleResolver {
    async fn resolve(&self, handle: &str) -> Result<Did> {
        if self.resolvers.is_empty() {
            return Err(Error::NoHandleResolvers);
        }
        let token = CancellationToken::new();
        let mut attempts = JoinSet::new();
        for resolver in &self.resolvers {
            let resolver = Arc::clone(resolver);
            let token = token.clone();
            let handle = handle.to_string();
            attempts.spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    result = resolver.resolve(&handle) => result,
                }
            });
        }
        let outcome = tokio::time::timeout(self.timeout, first_success(&mut attempts)).await;
        token.cancel();
        // stragglers finish on their own and their results are dropped
        attempts.detach_all();
        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(handle, timeout = ?self.timeout, "handle resolution timed out");
                Err(Error::TimedOut)
            }
        }
    }
}

async fn first_success(attempts: &mut JoinSet<Result<Did>>) -> Result<Did> {
    let mut errors = Vec::new();
    while let Some(joined) = attempts.join_next().await {
        match joined {
            Ok(Ok(did)) => return Ok(did),
            Ok(Err(error)) => errors.push(error),
            Err(error) => {
                tracing::warn!(%error, "handle resolver task failed");
                errors.push(Error::Task(error.to_string()));
            }
        }
    }
    Err(Error::Joined(JoinedErrors(errors)))
}
