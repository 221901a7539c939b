use super::HandleResolver;
use crate::error::{Error, Result};
use crate::types::{handle_host, Did};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;

const SUBDOMAIN: &str = "_atproto";
const PREFIX: &str = "did=";
const DNS_PORT: u16 = 53;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum DnsTxtError {
    /// Worth asking the next nameserver.
    #[error("temporary dns failure: {0}")]
    Temporary(Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("{0}")]
    Permanent(Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Looks up the TXT records of a name. An empty answer is not an error.
#[async_trait]
pub trait DnsTxtResolver {
    async fn resolve(&self, query: &str) -> core::result::Result<Vec<String>, DnsTxtError>;
}

/// [`DnsTxtResolver`] backed by hickory, either against one nameserver or the system configuration.
pub struct HickoryDnsTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryDnsTxtResolver {
    pub fn system() -> Result<Self> {
        let (config, opts) = read_system_conf().map_err(|e| Error::DnsResolver(Box::new(e)))?;
        Ok(Self { resolver: TokioAsyncResolver::tokio(config, uncached(opts)) })
    }
    pub fn with_nameserver(addr: IpAddr) -> Self {
        let config = ResolverConfig::from_parts(
            None,
            Vec::new(),
            NameServerConfigGroup::from_ips_clear(&[addr], DNS_PORT, true),
        );
        Self { resolver: TokioAsyncResolver::tokio(config, nameserver_opts()) }
    }
}

fn nameserver_opts() -> ResolverOpts {
    let mut opts = uncached(ResolverOpts::default());
    opts.timeout = CONNECT_TIMEOUT;
    opts.attempts = 1;
    opts
}

// every lookup goes to the network
fn uncached(mut opts: ResolverOpts) -> ResolverOpts {
    opts.cache_size = 0;
    opts
}

#[async_trait]
impl DnsTxtResolver for HickoryDnsTxtResolver {
    async fn resolve(&self, query: &str) -> core::result::Result<Vec<String>, DnsTxtError> {
        match self.resolver.txt_lookup(query).await {
            Ok(lookup) => Ok(lookup.iter().map(|txt| txt.to_string()).collect()),
            Err(error) => classify(error),
        }
    }
}

fn classify(error: ResolveError) -> core::result::Result<Vec<String>, DnsTxtError> {
    let temporary = match error.kind() {
        ResolveErrorKind::Timeout | ResolveErrorKind::NoConnections | ResolveErrorKind::Io(_) => {
            true
        }
        ResolveErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::ServFail | ResponseCode::Refused => true,
            ResponseCode::NoError | ResponseCode::NXDomain => return Ok(Vec::new()),
            _ => false,
        },
        _ => false,
    };
    if temporary {
        Err(DnsTxtError::Temporary(Box::new(error)))
    } else {
        Err(DnsTxtError::Permanent(Box::new(error)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct DnsHandleResolverConfig {
    /// Tried in order. Empty means the system resolver.
    pub nameservers: Vec<IpAddr>,
}

/// Resolves a handle from the `did=` TXT record at `_atproto.<handle>`.
///
/// Nameservers are asked in order; only a temporary failure moves on to the next one.
pub struct DnsHandleResolver<R = HickoryDnsTxtResolver> {
    txt_resolvers: Vec<R>,
}

impl DnsHandleResolver {
    pub fn new(config: DnsHandleResolverConfig) -> Result<Self> {
        let txt_resolvers = if config.nameservers.is_empty() {
            vec![HickoryDnsTxtResolver::system()?]
        } else {
            config.nameservers.into_iter().map(HickoryDnsTxtResolver::with_nameserver).collect()
        };
        Ok(Self { txt_resolvers })
    }
}

impl<R> DnsHandleResolver<R> {
    pub fn with_txt_resolvers(txt_resolvers: Vec<R>) -> Self {
        Self { txt_resolvers }
    }
}

#[async_trait]
impl<R> HandleResolver for DnsHandleResolver<R>
where
    R: DnsTxtResolver + Send + Sync + 'static,
{
    async fn resolve(&self, handle: &str) -> Result<Did> {
        let query = format!("{SUBDOMAIN}.{}", handle_host(handle));
        for (i, txt_resolver) in self.txt_resolvers.iter().enumerate() {
            match txt_resolver.resolve(&query).await {
                Ok(records) => {
                    return records
                        .iter()
                        .find_map(|record| record.strip_prefix(PREFIX))
                        .map(Did::from)
                        .ok_or(Error::DnsResolutionFailed);
                }
                Err(DnsTxtError::Temporary(error)) => {
                    tracing::debug!(%query, nameserver = i, %error, "trying next nameserver");
                }
                Err(DnsTxtError::Permanent(error)) => return Err(Error::DnsResolver(error)),
            }
        }
        Err(Error::DnsResolutionFailed)
    }
}
