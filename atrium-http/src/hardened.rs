use crate::address::{is_restricted_address, HostResolver, SystemHostResolver};
use crate::client::{DefaultHttpClient, HttpClient};
use crate::error::{Error, Result};
use async_trait::async_trait;
use atrium_common::retry::{self, do_with_retry, Failure, LinearRetryStrategy};
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION};
use http::{Method, Request, Response, StatusCode, Uri};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

const MAX_RETRIES: u32 = 10;
const BACKOFF: Duration = Duration::from_secs(2);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Configuration for [`HardenedHttpClient`]. Every `None` falls back to a default.
pub struct HardenedHttpClientConfig<T = DefaultHttpClient> {
    /// The client that actually sends requests. Defaults to [`DefaultHttpClient`].
    pub http_client: Option<Arc<T>>,
    /// Overall deadline for a call, including retries and redirects. Defaults to 10 seconds.
    pub timeout: Option<Duration>,
    /// Maximum number of redirects to follow. `Some(0)` returns redirect responses as-is.
    pub max_redirects: Option<usize>,
    /// Used to check where a hostname points before connecting. Defaults to the system resolver.
    pub host_resolver: Option<Arc<dyn HostResolver + Send + Sync + 'static>>,
}

impl<T> Default for HardenedHttpClientConfig<T> {
    fn default() -> Self {
        Self { http_client: None, timeout: None, max_redirects: None, host_resolver: None }
    }
}

/// An [`HttpClient`] that validates every outgoing request against SSRF rules
/// and retries server errors with a linear backoff.
pub struct HardenedHttpClient<T = DefaultHttpClient> {
    http_client: Arc<T>,
    timeout: Duration,
    max_redirects: usize,
    host_resolver: Arc<dyn HostResolver + Send + Sync + 'static>,
}

impl<T> HardenedHttpClient<T>
where
    T: Default,
{
    pub fn new(config: HardenedHttpClientConfig<T>) -> Self {
        Self {
            http_client: config.http_client.unwrap_or_default(),
            timeout: config.timeout.unwrap_or(DEFAULT_CLIENT_TIMEOUT),
            max_redirects: config.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS),
            host_resolver: config.host_resolver.unwrap_or_else(|| Arc::new(SystemHostResolver)),
        }
    }
}

impl<T> HardenedHttpClient<T> {
    /// Harden an existing client, keeping the default timeout, redirect limit and host resolver.
    pub fn wrap(http_client: Arc<T>) -> Self {
        Self {
            http_client,
            timeout: DEFAULT_CLIENT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            host_resolver: Arc::new(SystemHostResolver),
        }
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HardenedHttpClient {
    fn default() -> Self {
        Self::new(HardenedHttpClientConfig::default())
    }
}

impl<T> HardenedHttpClient<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    async fn send_following_redirects(
        &self,
        mut request: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>> {
        let mut redirects = 0;
        loop {
            let response = self.send_validated(&request).await?;
            if self.max_redirects == 0 || !is_redirect(response.status()) {
                return Ok(response);
            }
            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(response);
            };
            if redirects == self.max_redirects {
                return Err(Error::TooManyRedirects(redirects));
            }
            redirects += 1;
            let location = location
                .to_str()
                .map_err(|_| Error::Redirect(format!("{location:?}")))?
                .to_string();
            tracing::debug!(from = %request.uri(), to = %location, "following redirect");
            request = redirect_request(request, response.status(), &location)?;
        }
    }
    async fn send_validated(&self, request: &Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        self.validate_request(request.uri()).await?;
        let http_client = &self.http_client;
        let mut strategy = LinearRetryStrategy::new(MAX_RETRIES, BACKOFF, MAX_BACKOFF);
        do_with_retry(
            || async move {
                let response = http_client
                    .send_http(clone_request(request))
                    .await
                    .map_err(|e| Failure::Abort(Error::HttpClient(e)))?;
                if response.status().is_server_error() {
                    let status = response.status();
                    tracing::warn!(uri = %request.uri(), %status, "server error");
                    return Err(Failure::Retry(Error::ServerStatus(status)));
                }
                Ok::<_, Failure<Error>>(response)
            },
            &mut strategy,
        )
        .await
        .map_err(|e| match e {
            retry::Error::TooManyRetries { last } => Error::TooManyRetries(Box::new(last)),
            retry::Error::Aborted(error) => error,
        })
    }
    async fn validate_request(&self, uri: &Uri) -> Result<()> {
        let host = uri
            .host()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']'))
            .ok_or_else(|| Error::MissingHost(uri.to_string()))?;
        let is_localhost = host.eq_ignore_ascii_case("localhost");
        match uri.scheme_str().map(str::to_ascii_lowercase).as_deref() {
            Some("https") => {}
            Some("http") if is_localhost => {}
            scheme => return Err(Error::InvalidScheme(scheme.unwrap_or_default().to_string())),
        }
        let addrs = match host.parse::<IpAddr>() {
            Ok(addr) => vec![addr],
            Err(_) => {
                // host names are case-insensitive
                let addrs = self
                    .host_resolver
                    .lookup(&host.to_ascii_lowercase())
                    .await
                    .map_err(|source| Error::HostLookup { host: host.to_string(), source })?;
                if addrs.is_empty() {
                    return Err(Error::HostLookup {
                        host: host.to_string(),
                        source: std::io::ErrorKind::NotFound.into(),
                    });
                }
                addrs
            }
        };
        let restricted = addrs.into_iter().find(|addr| is_restricted_address(*addr, is_localhost));
        if let Some(addr) = restricted {
            tracing::warn!(%host, %addr, "refusing request to restricted address");
            return Err(Error::PrivateAddress(addr));
        }
        Ok(())
    }
}

#[async_trait]
impl<T> HttpClient for HardenedHttpClient<T>
where
    T: HttpClient + Send + Sync + 'static,
{
    async fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> core::result::Result<Response<Vec<u8>>, Box<dyn std::error::Error + Send + Sync + 'static>>
    {
        match tokio::time::timeout(self.timeout, self.send_following_redirects(request)).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(Box::new(Error::Timeout(self.timeout))),
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn clone_request(request: &Request<Vec<u8>>) -> Request<Vec<u8>> {
    let mut cloned = Request::new(request.body().clone());
    *cloned.method_mut() = request.method().clone();
    *cloned.uri_mut() = request.uri().clone();
    *cloned.version_mut() = request.version();
    *cloned.headers_mut() = request.headers().clone();
    cloned
}

fn redirect_request(
    mut request: Request<Vec<u8>>,
    status: StatusCode,
    location: &str,
) -> Result<Request<Vec<u8>>> {
    let target = Url::parse(&request.uri().to_string())
        .and_then(|base| base.join(location))
        .map_err(|e| Error::Redirect(format!("{location}: {e}")))?;
    let uri = target
        .as_str()
        .parse::<Uri>()
        .map_err(|e| Error::Redirect(format!("{location}: {e}")))?;
    if uri.authority() != request.uri().authority() {
        request.headers_mut().remove(AUTHORIZATION);
        request.headers_mut().remove(COOKIE);
    }
    let rewrite_to_get = match status {
        StatusCode::SEE_OTHER => request.method() != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => request.method() == Method::POST,
        _ => false,
    };
    if rewrite_to_get {
        *request.method_mut() = Method::GET;
        request.body_mut().clear();
        request.headers_mut().remove(CONTENT_TYPE);
        request.headers_mut().remove(CONTENT_LENGTH);
    }
    *request.uri_mut() = uri;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::io;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Default)]
    struct MockClient {
        responses: Mutex<VecDeque<Response<Vec<u8>>>>,
        requests: Mutex<Vec<(Method, Uri)>>,
    }

    impl MockClient {
        fn with_statuses(statuses: &[u16]) -> Self {
            let responses = statuses
                .iter()
                .map(|status| {
                    Response::builder().status(*status).body(Vec::new()).expect("invalid response")
                })
                .collect();
            Self { responses: Mutex::new(responses), ..Default::default() }
        }
        fn with_responses(responses: Vec<Response<Vec<u8>>>) -> Self {
            Self { responses: Mutex::new(responses.into()), ..Default::default() }
        }
        fn requests(&self) -> Vec<(Method, Uri)> {
            self.requests.lock().expect("poisoned").clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockClient {
        async fn send_http(
            &self,
            request: Request<Vec<u8>>,
        ) -> core::result::Result<
            Response<Vec<u8>>,
            Box<dyn std::error::Error + Send + Sync + 'static>,
        > {
            self.requests
                .lock()
                .expect("poisoned")
                .push((request.method().clone(), request.uri().clone()));
            self.responses
                .lock()
                .expect("poisoned")
                .pop_front()
                .ok_or_else(|| "no more responses".into())
        }
    }

    struct MockHostResolver {
        hosts: HashMap<&'static str, Vec<IpAddr>>,
    }

    #[async_trait]
    impl HostResolver for MockHostResolver {
        async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
            self.hosts.get(host).cloned().ok_or_else(|| io::ErrorKind::NotFound.into())
        }
    }

    fn hardened(client: Arc<MockClient>, timeout: Duration) -> HardenedHttpClient<MockClient> {
        let hosts = [
            ("example.com", vec!["93.184.215.14".parse().expect("invalid address")]),
            ("localhost", vec!["127.0.0.1".parse().expect("invalid address")]),
            ("internal.example.com", vec!["10.0.0.8".parse().expect("invalid address")]),
            (
                "mixed.example.com",
                vec![
                    "93.184.215.14".parse().expect("invalid address"),
                    "192.168.1.20".parse().expect("invalid address"),
                ],
            ),
        ]
        .into_iter()
        .collect();
        HardenedHttpClient::new(HardenedHttpClientConfig {
            http_client: Some(client),
            timeout: Some(timeout),
            max_redirects: None,
            host_resolver: Some(Arc::new(MockHostResolver { hosts })),
        })
    }

    fn get(uri: &str) -> Request<Vec<u8>> {
        Request::builder().uri(uri).body(Vec::new()).expect("invalid request")
    }

    async fn send(client: &HardenedHttpClient<MockClient>, uri: &str) -> Result<Response<Vec<u8>>> {
        client.send_http(get(uri)).await.map_err(|e| match e.downcast::<Error>() {
            Ok(error) => *error,
            Err(other) => panic!("unexpected error type: {other}"),
        })
    }

    #[tokio::test]
    async fn reject_invalid_schemes() {
        let mock = Arc::new(MockClient::with_statuses(&[200, 200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        for uri in ["ftp://example.com/file", "http://example.com/", "ws://localhost/"] {
            let err = send(&client, uri).await.expect_err("must be rejected");
            assert!(matches!(err, Error::InvalidScheme(_)), "{uri}: {err:?}");
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn allow_http_for_localhost() {
        let mock = Arc::new(MockClient::with_statuses(&[200, 200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        for uri in ["http://localhost:8080/path", "http://LocalHost/path"] {
            let response = send(&client, uri).await.expect("localhost should be allowed");
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn host_lookup_ignores_case() {
        let mock = Arc::new(MockClient::with_statuses(&[200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let response = send(&client, "https://Example.COM/").await.expect("should be allowed");
        assert_eq!(response.status(), StatusCode::OK);
        let err = send(&client, "https://INTERNAL.example.com/").await.expect_err("must fail");
        assert!(matches!(err, Error::PrivateAddress(_)), "{err:?}");
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn reject_private_addresses() {
        let mock = Arc::new(MockClient::with_statuses(&[200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        for (uri, expected) in [
            ("https://internal.example.com/", "10.0.0.8"),
            ("https://mixed.example.com/", "192.168.1.20"),
            ("https://192.168.0.1/", "192.168.0.1"),
            ("https://[fd00::1]/", "fd00::1"),
            ("https://169.254.169.254/latest/meta-data", "169.254.169.254"),
            ("https://127.0.0.1/", "127.0.0.1"),
        ] {
            match send(&client, uri).await {
                Err(Error::PrivateAddress(addr)) => {
                    assert_eq!(addr, expected.parse::<IpAddr>().expect("invalid address"))
                }
                other => panic!("{uri}: must be Error::PrivateAddress, got {other:?}"),
            }
        }
        assert!(mock.requests().is_empty());
        let response = send(&client, "https://example.com/").await.expect("public host");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn lookup_failure_is_not_retried() {
        let mock = Arc::new(MockClient::with_statuses(&[200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let err = send(&client, "https://unknown.example.com/").await.expect_err("must fail");
        assert!(matches!(err, Error::HostLookup { .. }), "{err:?}");
        assert!(mock.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_server_errors() {
        let mock = Arc::new(MockClient::with_statuses(&[503, 500, 200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let start = Instant::now();
        let response = send(&client, "https://example.com/").await.expect("should succeed");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mock.requests().len(), 3);
        // 2s + 4s
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn do_not_retry_client_errors() {
        let mock = Arc::new(MockClient::with_statuses(&[404, 200]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let response = send(&client, "https://example.com/").await.expect("should return 404");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn do_not_retry_transport_errors() {
        let mock = Arc::new(MockClient::with_statuses(&[]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let err = send(&client, "https://example.com/").await.expect_err("must fail");
        assert!(matches!(err, Error::HttpClient(_)), "{err:?}");
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn too_many_retries() {
        let mock = Arc::new(MockClient::with_statuses(&[502; 12]));
        let client = hardened(mock.clone(), Duration::from_secs(3600));
        let err = send(&client, "https://example.com/").await.expect_err("must fail");
        match err {
            Error::TooManyRetries(last) => {
                assert!(matches!(*last, Error::ServerStatus(StatusCode::BAD_GATEWAY)), "{last:?}")
            }
            other => panic!("must be Error::TooManyRetries, got {other:?}"),
        }
        // the first attempt plus ten retries
        assert_eq!(mock.requests().len(), 11);
    }

    #[tokio::test(start_paused = true)]
    async fn client_timeout_covers_retries() {
        let mock = Arc::new(MockClient::with_statuses(&[500; 12]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let start = Instant::now();
        let err = send(&client, "https://example.com/").await.expect_err("must time out");
        assert!(matches!(err, Error::Timeout(_)), "{err:?}");
        assert!(start.elapsed() >= DEFAULT_CLIENT_TIMEOUT);
        // attempts at 0s, 2s and 6s; the next would start at 12s
        assert_eq!(mock.requests().len(), 3);
    }

    fn redirect(status: u16, location: &str) -> Response<Vec<u8>> {
        Response::builder()
            .status(status)
            .header(LOCATION, location)
            .body(Vec::new())
            .expect("invalid response")
    }

    fn ok() -> Response<Vec<u8>> {
        Response::builder().status(200).body(Vec::new()).expect("invalid response")
    }

    #[tokio::test]
    async fn follow_redirects() {
        let mock = Arc::new(MockClient::with_responses(vec![
            redirect(301, "/moved"),
            redirect(302, "https://mixed.example.com/"),
            ok(),
        ]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let err = send(&client, "https://example.com/start").await.expect_err("must fail");
        assert!(matches!(err, Error::PrivateAddress(_)), "{err:?}");
        assert_eq!(
            mock.requests().into_iter().map(|(_, uri)| uri.to_string()).collect::<Vec<_>>(),
            ["https://example.com/start", "https://example.com/moved"]
        );
    }

    #[tokio::test]
    async fn see_other_becomes_get() {
        let mock = Arc::new(MockClient::with_responses(vec![redirect(303, "/done"), ok()]));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let request = Request::builder()
            .method(Method::POST)
            .uri("https://example.com/submit")
            .body(b"payload".to_vec())
            .expect("invalid request");
        let response = client.send_http(request).await.expect("should follow redirect");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            mock.requests(),
            [
                (Method::POST, "https://example.com/submit".parse::<Uri>().expect("invalid uri")),
                (Method::GET, "https://example.com/done".parse::<Uri>().expect("invalid uri")),
            ]
        );
    }

    #[tokio::test]
    async fn too_many_redirects() {
        let mock = Arc::new(MockClient::with_responses(
            (0..=DEFAULT_MAX_REDIRECTS).map(|i| redirect(307, &format!("/{i}"))).collect(),
        ));
        let client = hardened(mock.clone(), DEFAULT_CLIENT_TIMEOUT);
        let err = send(&client, "https://example.com/").await.expect_err("must fail");
        assert!(matches!(err, Error::TooManyRedirects(DEFAULT_MAX_REDIRECTS)), "{err:?}");
        assert_eq!(mock.requests().len(), DEFAULT_MAX_REDIRECTS + 1);
    }

    #[tokio::test]
    async fn redirects_disabled() {
        let mock = Arc::new(MockClient::with_responses(vec![redirect(302, "/next"), ok()]));
        let client = HardenedHttpClient::new(HardenedHttpClientConfig {
            http_client: Some(mock.clone()),
            max_redirects: Some(0),
            ..Default::default()
        });
        let response = client.send_http(get("https://1.1.1.1/")).await.expect("should succeed");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn wrap_default_client() -> core::result::Result<(), Box<dyn std::error::Error + Send + Sync>>
    {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/atproto-did")
            .with_status(200)
            .with_body("did:plc:1234")
            .create_async()
            .await;
        let client = HardenedHttpClient::wrap(Arc::new(DefaultHttpClient::default()));
        let response = client
            .send_http(get(&format!(
                "http://localhost:{}/.well-known/atproto-did",
                server.socket_address().port()
            )))
            .await?;
        mock.assert_async().await;
        assert_eq!(response.body(), b"did:plc:1234");
        Ok(())
    }
}
