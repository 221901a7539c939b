use http::StatusCode;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid scheme. only https and http with localhost supported. got {0:?}")]
    InvalidScheme(String),
    #[error("private addresses not allowed: {0}")]
    PrivateAddress(IpAddr),
    #[error("request has no host: {0}")]
    MissingHost(String),
    #[error("could not resolve host {host}: {source}")]
    HostLookup {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    ServerStatus(StatusCode),
    #[error("too many retries, last error: {0}")]
    TooManyRetries(#[source] Box<Error>),
    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),
    #[error("invalid redirect location: {0}")]
    Redirect(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("http client error: {0}")]
    HttpClient(Box<dyn std::error::Error + Send + Sync + 'static>),
}

pub type Result<T> = core::result::Result<T, Error>;
