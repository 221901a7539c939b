mod plc_resolver;
mod routing_resolver;
mod web_resolver;

pub use self::plc_resolver::{
    PlcDocumentResolver, PlcDocumentResolverConfig, DEFAULT_PLC_DIRECTORY_URL,
};
pub use self::routing_resolver::RoutingDocumentResolver;
pub use self::web_resolver::WebDocumentResolver;
use crate::error::{Error, Result};
use crate::handle::{resolve_identifier, HandleResolver};
use crate::types::Did;
use async_trait::async_trait;

/// Maps an identifier (handle or DID) to the URL its DID document is served from.
#[async_trait]
pub trait DocumentResolver {
    /// DID methods this resolver accepts.
    fn supported_methods(&self) -> Vec<&str>;
    /// Handles are first turned into a DID with `handle_resolver`.
    async fn resolve_document_url(
        &self,
        handle_resolver: &(dyn HandleResolver + Send + Sync),
        identifier: &str,
    ) -> Result<String>;
}

/// Resolves `identifier` to a DID whose method is in `supported`.
pub(crate) async fn resolve_supported_did(
    handle_resolver: &(dyn HandleResolver + Send + Sync),
    identifier: &str,
    supported: &[&str],
) -> Result<Did> {
    let did = resolve_identifier(handle_resolver, identifier).await.map_err(|e| {
        Error::Identifier { identifier: identifier.to_string(), source: Box::new(e) }
    })?;
    verify_did_method(&did, supported)?;
    Ok(did)
}

pub(crate) fn verify_did_method(did: &Did, supported: &[&str]) -> Result<()> {
    let method = did.method()?;
    if supported.contains(&method) {
        Ok(())
    } else {
        Err(Error::InvalidDidType {
            supported: supported.iter().map(|s| s.to_string()).collect(),
            got: method.to_string(),
        })
    }
}
