mod dns_resolver;
mod parallel_resolver;
mod well_known_resolver;

pub use self::dns_resolver::{
    DnsHandleResolver, DnsHandleResolverConfig, DnsTxtError, DnsTxtResolver,
    HickoryDnsTxtResolver,
};
pub use self::parallel_resolver::{
    ParallelHandleResolver, ParallelHandleResolverConfig, DEFAULT_PARALLEL_TIMEOUT,
};
pub use self::well_known_resolver::{WellKnownHandleResolver, WellKnownHandleResolverConfig};
use crate::error::Result;
use crate::types::{is_did, Did};
use async_trait::async_trait;

/// Resolves a handle (with or without a leading `@`) to a DID.
#[async_trait]
pub trait HandleResolver {
    async fn resolve(&self, handle: &str) -> Result<Did>;
}

/// Returns `identifier` as-is if it is already a DID, otherwise resolves it as a handle.
pub async fn resolve_identifier(
    handle_resolver: &(dyn HandleResolver + Send + Sync),
    identifier: &str,
) -> Result<Did> {
    if is_did(identifier) {
        return Ok(Did::from(identifier));
    }
    let did = handle_resolver.resolve(identifier).await?;
    tracing::debug!(handle = identifier, %did, "resolved handle");
    Ok(did)
}
