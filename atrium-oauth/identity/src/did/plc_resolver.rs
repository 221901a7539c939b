use super::{resolve_supported_did, DocumentResolver};
use crate::error::Result;
use crate::handle::HandleResolver;
use async_trait::async_trait;

pub const DEFAULT_PLC_DIRECTORY_URL: &str = "https://plc.directory";

const METHODS: [&str; 1] = ["plc"];

#[derive(Clone, Debug)]
pub struct PlcDocumentResolverConfig {
    pub plc_directory_url: String,
}

impl Default for PlcDocumentResolverConfig {
    fn default() -> Self {
        Self { plc_directory_url: DEFAULT_PLC_DIRECTORY_URL.to_string() }
    }
}

/// Locates `did:plc` documents in a PLC directory.
#[derive(Clone, Debug)]
pub struct PlcDocumentResolver {
    plc_directory_url: String,
}

impl PlcDocumentResolver {
    pub fn new(config: PlcDocumentResolverConfig) -> Self {
        Self { plc_directory_url: config.plc_directory_url.trim_end_matches('/').to_string() }
    }
}

impl Default for PlcDocumentResolver {
    fn default() -> Self {
        Self::new(PlcDocumentResolverConfig::default())
    }
}

#[async_trait]
impl DocumentResolver for PlcDocumentResolver {
    fn supported_methods(&self) -> Vec<&str> {
        METHODS.to_vec()
    }
    async fn resolve_document_url(
        &self,
        handle_resolver: &(dyn HandleResolver + Send + Sync),
        identifier: &str,
    ) -> Result<String> {
        let did = resolve_supported_did(handle_resolver, identifier, &METHODS).await?;
        Ok(format!("{}/{did}", self.plc_directory_url))
    }
}
