use super::HandleResolver;
use crate::error::{Error, Result};
use crate::types::{handle_host, Did};
use async_trait::async_trait;
use atrium_http::http::header::CONTENT_TYPE;
use atrium_http::http::{Request, StatusCode};
use atrium_http::{HardenedHttpClient, HttpClient};
use std::sync::Arc;

const WELL_KNOWN_PATH: &str = "/.well-known/atproto-did";
const TEXT_PLAIN: &str = "text/plain";

#[derive(Clone, Debug)]
pub struct WellKnownHandleResolverConfig<T> {
    pub http_client: Arc<T>,
}

/// Resolves a handle through `https://<handle>/.well-known/atproto-did`.
pub struct WellKnownHandleResolver<T = HardenedHttpClient> {
    http_client: Arc<T>,
}

impl<T> WellKnownHandleResolver<T> {
    pub fn new(config: WellKnownHandleResolverConfig<T>) -> Self {
        Self { http_client: config.http_client }
    }
}

impl Default for WellKnownHandleResolver {
    fn default() -> Self {
        Self { http_client: Arc::new(HardenedHttpClient::default()) }
    }
}

#[async_trait]
impl<T> HandleResolver for WellKnownHandleResolver<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    async fn resolve(&self, handle: &str) -> Result<Did> {
        let url = format!("https://{}{WELL_KNOWN_PATH}", handle_host(handle));
        let res = self
            .http_client
            .send_http(Request::builder().uri(url).body(Vec::new())?)
            .await
            .map_err(Error::HttpClient)?;
        if res.status() != StatusCode::OK {
            return Err(Error::HttpStatus(res.status()));
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default();
        if !content_type.starts_with(TEXT_PLAIN) {
            return Err(Error::ContentType(content_type));
        }
        Ok(Did::from(String::from_utf8(res.into_body())?))
    }
}
