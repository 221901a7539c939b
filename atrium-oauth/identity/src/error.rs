use atrium_http::http::StatusCode;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no `did=` TXT record found")]
    DnsResolutionFailed,
    #[error("dns resolver error: {0}")]
    DnsResolver(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("invalid DID type for this resolver: supports {supported:?} but got {got:?}")]
    InvalidDidType { supported: Vec<String>, got: String },
    #[error("malformed DID: {0}")]
    MalformedDid(String),
    #[error("no resolver found for did {0}")]
    NoResolverFound(String),
    #[error("no service of type AtprotoPersonalDataServer found in document")]
    NoPdsFound,
    #[error("expected service type {expected:?}, but got {got:?}")]
    InvalidServiceType { expected: &'static str, got: String },
    #[error("service endpoint is an invalid URL: {0}")]
    InvalidServiceEndpoint(#[source] url::ParseError),
    #[error("resolution timed out")]
    TimedOut,
    #[error(transparent)]
    Joined(JoinedErrors),
    #[error("resolver task failed: {0}")]
    Task(String),
    #[error("resolution cancelled")]
    Cancelled,
    #[error("no handle resolvers configured")]
    NoHandleResolvers,
    #[error("could not determine did for identifier {identifier}: {source}")]
    Identifier {
        identifier: String,
        #[source]
        source: Box<Error>,
    },
    #[error("did document for {did} does not include the handle {handle}")]
    HandleMismatch { did: String, handle: String },
    #[error("could not get document URL: {0}")]
    DocumentUrl(#[source] Box<Error>),
    #[error("expected status 200 OK, got {0}")]
    HttpStatus(StatusCode),
    #[error("expected Content-Type text/plain, got {0:?}")]
    ContentType(String),
    #[error("response body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("could not get a response from url: {0}")]
    HttpClient(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("could not build request: {0}")]
    Http(#[from] atrium_http::http::Error),
    #[error("could not parse DID document: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// Every failure of a set of concurrent attempts, in the order they completed.
#[derive(Debug)]
pub struct JoinedErrors(pub Vec<Error>);

impl JoinedErrors {
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }
}

impl fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for JoinedErrors {}

pub type Result<T> = core::result::Result<T, Error>;
