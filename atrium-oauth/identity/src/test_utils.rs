use crate::error::Result;
use crate::handle::HandleResolver;
use crate::types::Did;
use async_trait::async_trait;
use atrium_http::http::header::CONTENT_TYPE;
use atrium_http::http::{Request, Response, StatusCode};
use atrium_http::HttpClient;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Always resolves to the same DID and counts how often it was asked.
pub struct CountingHandleResolver {
    did: &'static str,
    calls: AtomicUsize,
}

impl CountingHandleResolver {
    pub fn new(did: &'static str) -> Self {
        Self { did, calls: AtomicUsize::new(0) }
    }
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HandleResolver for CountingHandleResolver {
    async fn resolve(&self, _: &str) -> Result<Did> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Did::from(self.did))
    }
}

struct Route {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

/// Serves canned responses by exact URI and records every request. Unknown URIs get a 404.
#[derive(Default)]
pub struct MockHttpClient {
    routes: HashMap<String, Route>,
    requests: Mutex<Vec<Request<Vec<u8>>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn route(
        mut self,
        uri: &str,
        status: StatusCode,
        content_type: Option<&'static str>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.routes.insert(uri.to_string(), Route { status, content_type, body: body.into() });
        self
    }
    pub fn uris(&self) -> Vec<String> {
        self.requests.lock().expect("poisoned").iter().map(|r| r.uri().to_string()).collect()
    }
    pub fn header(&self, index: usize, name: &str) -> Option<String> {
        self.requests.lock().expect("poisoned")[index]
            .headers()
            .get(name)
            .map(|value| value.to_str().expect("ascii header").to_string())
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send_http(
        &self,
        request: Request<Vec<u8>>,
    ) -> core::result::Result<Response<Vec<u8>>, Box<dyn std::error::Error + Send + Sync + 'static>>
    {
        let uri = request.uri().to_string();
        self.requests.lock().expect("poisoned").push(request);
        let Some(route) = self.routes.get(&uri) else {
            return Ok(Response::builder().status(StatusCode::NOT_FOUND).body(Vec::new())?);
        };
        let mut builder = Response::builder().status(route.status);
        if let Some(content_type) = route.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        Ok(builder.body(route.body.clone())?)
    }
}
