//! Ready-made resolvers for the public network.
//!
//! Each call builds a fresh set of resolvers; nothing here is global or cached.
use crate::did::{PlcDocumentResolver, RoutingDocumentResolver, WebDocumentResolver};
use crate::error::Result;
use crate::fetcher::{DocumentFetcher, DocumentFetcherConfig};
use crate::handle::{
    DnsHandleResolver, DnsHandleResolverConfig, HandleResolver, ParallelHandleResolver,
    ParallelHandleResolverConfig, WellKnownHandleResolver, WellKnownHandleResolverConfig,
};
use atrium_http::{HardenedHttpClient, HttpClient};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HANDLE_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(20);

/// Races DNS (system resolver) against the HTTPS well-known endpoint.
pub fn default_handle_resolver<T>(http_client: Arc<T>) -> Result<ParallelHandleResolver>
where
    T: HttpClient + Send + Sync + 'static,
{
    let dns: Arc<dyn HandleResolver + Send + Sync> =
        Arc::new(DnsHandleResolver::new(DnsHandleResolverConfig::default())?);
    let well_known: Arc<dyn HandleResolver + Send + Sync> =
        Arc::new(WellKnownHandleResolver::new(WellKnownHandleResolverConfig { http_client }));
    Ok(ParallelHandleResolver::new(ParallelHandleResolverConfig {
        timeout: DEFAULT_HANDLE_RESOLUTION_TIMEOUT,
        resolvers: vec![dns, well_known],
    }))
}

/// Routes `did:plc` to the public PLC directory and `did:web` to the DID's own host.
pub fn default_document_resolver() -> RoutingDocumentResolver {
    RoutingDocumentResolver::new()
        .with("plc", Arc::new(PlcDocumentResolver::default()))
        .with("web", Arc::new(WebDocumentResolver::new()))
}

pub fn default_document_fetcher() -> Result<DocumentFetcher<HardenedHttpClient>> {
    let http_client = Arc::new(HardenedHttpClient::default());
    Ok(DocumentFetcher::new(DocumentFetcherConfig {
        handle_resolver: Arc::new(default_handle_resolver(Arc::clone(&http_client))?),
        document_resolver: Arc::new(default_document_resolver()),
        http_client,
    }))
}
