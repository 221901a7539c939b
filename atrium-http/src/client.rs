use crate::address::GuardedDnsResolver;
use async_trait::async_trait;
use http::{Request, Response};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;

/// An abstract HTTP client.
#[async_trait]
pub trait HttpClient {
    /// Send an HTTP request and return the response.
    async fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> core::result::Result<Response<Vec<u8>>, Box<dyn std::error::Error + Send + Sync + 'static>>;
}

/// [`HttpClient`] implementation for [reqwest].
///
/// Redirects are not followed here; [`HardenedHttpClient`](crate::HardenedHttpClient)
/// follows them itself so that every hop is validated. The default client connects through
/// [`GuardedDnsResolver`], so names are checked again at connect time.
pub struct DefaultHttpClient {
    client: Client,
}

impl DefaultHttpClient {
    /// Wrap an already configured client, e.g. one with a cookie store or a custom user agent.
    ///
    /// The client should be built with [`Policy::none()`], otherwise redirects bypass validation,
    /// and with a [`GuardedDnsResolver`] to keep connect-time lookups on public addresses.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .redirect(Policy::none())
                .dns_resolver(Arc::new(GuardedDnsResolver::default()))
                .build()
                .unwrap_or_else(|error| {
                    tracing::warn!(%error, "failed to build http client, using reqwest defaults");
                    Client::new()
                }),
        }
    }
}

impl From<Client> for DefaultHttpClient {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> core::result::Result<Response<Vec<u8>>, Box<dyn std::error::Error + Send + Sync + 'static>>
    {
        let response = self.client.execute(request.try_into()?).await?;
        let mut builder = Response::builder().status(response.status());
        for (k, v) in response.headers() {
            builder = builder.header(k, v);
        }
        builder.body(response.bytes().await?.to_vec()).map_err(Into::into)
    }
}
