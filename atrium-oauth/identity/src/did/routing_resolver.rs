use super::DocumentResolver;
use crate::error::{Error, Result};
use crate::handle::{resolve_identifier, HandleResolver};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

type DynDocumentResolver = Arc<dyn DocumentResolver + Send + Sync + 'static>;

/// Dispatches to a [`DocumentResolver`] by DID method.
#[derive(Clone, Default)]
pub struct RoutingDocumentResolver {
    resolvers: BTreeMap<String, DynDocumentResolver>,
}

impl RoutingDocumentResolver {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, method: impl Into<String>, resolver: DynDocumentResolver) -> Self {
        self.insert(method, resolver);
        self
    }
    /// Replaces and returns any resolver previously registered for `method`.
    pub fn insert(
        &mut self,
        method: impl Into<String>,
        resolver: DynDocumentResolver,
    ) -> Option<DynDocumentResolver> {
        self.resolvers.insert(method.into(), resolver)
    }
}

impl<S> FromIterator<(S, DynDocumentResolver)> for RoutingDocumentResolver
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, DynDocumentResolver)>>(iter: I) -> Self {
        Self { resolvers: iter.into_iter().map(|(method, r)| (method.into(), r)).collect() }
    }
}

#[async_trait]
impl DocumentResolver for RoutingDocumentResolver {
    fn supported_methods(&self) -> Vec<&str> {
        self.resolvers.keys().map(String::as_str).collect()
    }
    async fn resolve_document_url(
        &self,
        handle_resolver: &(dyn HandleResolver + Send + Sync),
        identifier: &str,
    ) -> Result<String> {
        let did = resolve_identifier(handle_resolver, identifier).await.map_err(|e| {
            Error::Identifier { identifier: identifier.to_string(), source: Box::new(e) }
        })?;
        let method = did.method()?;
        let Some(resolver) = self.resolvers.get(method) else {
            return Err(Error::NoResolverFound(did.to_string()));
        };
        tracing::debug!(%did, method, "routing document resolution");
        // the DID is passed on so the handle is not resolved twice
        resolver.resolve_document_url(handle_resolver, did.as_str()).await
    }
}
