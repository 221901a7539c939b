use super::{resolve_supported_did, DocumentResolver};
use crate::error::{Error, Result};
use crate::handle::HandleResolver;
use async_trait::async_trait;

const METHODS: [&str; 1] = ["web"];
const DID_DOCUMENT_PATH: &str = "/.well-known/did.json";

/// Locates `did:web` documents on the host named by the DID.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebDocumentResolver;

impl WebDocumentResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentResolver for WebDocumentResolver {
    fn supported_methods(&self) -> Vec<&str> {
        METHODS.to_vec()
    }
    async fn resolve_document_url(
        &self,
        handle_resolver: &(dyn HandleResolver + Send + Sync),
        identifier: &str,
    ) -> Result<String> {
        let did = resolve_supported_did(handle_resolver, identifier, &METHODS).await?;
        let host_path = decode_host_path(did.method_specific_id()?)?;
        Ok(format!("https://{host_path}{DID_DOCUMENT_PATH}"))
    }
}

// `example.com%3A8080:u:alice` -> `example.com:8080/u/alice`
fn decode_host_path(id: &str) -> Result<String> {
    let path = id.replace(':', "/");
    let bytes = path.as_bytes();
    for (i, _) in path.match_indices('%') {
        let valid =
            bytes.get(i + 1..i + 3).is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(Error::MalformedDid(format!("invalid escape in did:web id {id:?}")));
        }
    }
    urlencoding::decode(&path)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::MalformedDid(format!("did:web id {id:?}: {e}")))
}
