use crate::did::DocumentResolver;
use crate::did_doc::DidDocument;
use crate::error::{Error, Result};
use crate::handle::{resolve_identifier, HandleResolver};
use crate::types::{handle_host, is_did, Did};
use atrium_http::http::header::ACCEPT;
use atrium_http::http::{Request, StatusCode};
use atrium_http::{HardenedHttpClient, HttpClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DID_DOCUMENT_ACCEPT: &str = "application/did+ld+json,application/json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub did: Did,
    pub pds: String,
}

pub struct DocumentFetcherConfig<T> {
    pub handle_resolver: Arc<dyn HandleResolver + Send + Sync + 'static>,
    pub document_resolver: Arc<dyn DocumentResolver + Send + Sync + 'static>,
    pub http_client: Arc<T>,
}

/// Turns a handle or DID into its DID document.
pub struct DocumentFetcher<T = HardenedHttpClient> {
    handle_resolver: Arc<dyn HandleResolver + Send + Sync + 'static>,
    document_resolver: Arc<dyn DocumentResolver + Send + Sync + 'static>,
    http_client: Arc<T>,
}

impl<T> DocumentFetcher<T> {
    pub fn new(config: DocumentFetcherConfig<T>) -> Self {
        Self {
            handle_resolver: config.handle_resolver,
            document_resolver: config.document_resolver,
            http_client: config.http_client,
        }
    }
    pub fn handle_resolver(&self) -> &(dyn HandleResolver + Send + Sync) {
        self.handle_resolver.as_ref()
    }
}

impl<T> DocumentFetcher<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    pub async fn get_document(&self, identifier: &str) -> Result<DidDocument> {
        let url = self
            .document_resolver
            .resolve_document_url(self.handle_resolver.as_ref(), identifier)
            .await
            .map_err(|e| Error::DocumentUrl(Box::new(e)))?;
        tracing::debug!(identifier, %url, "fetching did document");
        let res = self
            .http_client
            .send_http(
                Request::builder()
                    .header(ACCEPT, DID_DOCUMENT_ACCEPT)
                    .uri(url.as_str())
                    .body(Vec::new())?,
            )
            .await
            .map_err(Error::HttpClient)?;
        if res.status() != StatusCode::OK {
            return Err(Error::HttpStatus(res.status()));
        }
        Ok(serde_json::from_slice(res.body())?)
    }
    /// Resolves `identifier` to its DID and PDS endpoint.
    ///
    /// For a handle, the document must list it in `alsoKnownAs` when that field is present.
    pub async fn resolve_identity(&self, identifier: &str) -> Result<ResolvedIdentity> {
        let did = resolve_identifier(self.handle_resolver.as_ref(), identifier).await.map_err(
            |e| Error::Identifier { identifier: identifier.to_string(), source: Box::new(e) },
        )?;
        let document = self.get_document(did.as_str()).await?;
        if !is_did(identifier) {
            let aka = format!("at://{}", handle_host(identifier));
            if let Some(also_known_as) = &document.also_known_as {
                if !also_known_as.contains(&aka) {
                    return Err(Error::HandleMismatch {
                        did: document.id,
                        handle: handle_host(identifier).to_string(),
                    });
                }
            }
        }
        let pds = document.get_pds_endpoint(true)?.to_string();
        Ok(ResolvedIdentity { did: Did::from(document.id), pds })
    }
}
