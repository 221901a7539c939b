use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

/// Resolves a hostname to the addresses a request would connect to.
#[async_trait]
pub trait HostResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Uses the system resolver via [`tokio::net::lookup_host`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemHostResolver;

#[async_trait]
impl HostResolver for SystemHostResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(tokio::net::lookup_host((host, 0)).await?.map(|addr| addr.ip()).collect())
    }
}

/// A [`reqwest`] DNS resolver that refuses names pointing at restricted addresses.
///
/// Requests are validated before they are sent, but the connection does its own lookup.
/// Installing this on the client closes the gap where a name is re-pointed in between.
#[derive(Clone)]
pub struct GuardedDnsResolver {
    host_resolver: Arc<dyn HostResolver + Send + Sync + 'static>,
}

impl GuardedDnsResolver {
    pub fn new(host_resolver: Arc<dyn HostResolver + Send + Sync + 'static>) -> Self {
        Self { host_resolver }
    }
}

impl Default for GuardedDnsResolver {
    fn default() -> Self {
        Self::new(Arc::new(SystemHostResolver))
    }
}

impl Resolve for GuardedDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(guarded_lookup(Arc::clone(&self.host_resolver), name))
    }
}

async fn guarded_lookup(
    host_resolver: Arc<dyn HostResolver + Send + Sync + 'static>,
    name: Name,
) -> core::result::Result<Addrs, Box<dyn std::error::Error + Send + Sync + 'static>> {
    let host = name.as_str().to_ascii_lowercase();
    let allow_loopback = host == "localhost";
    let addrs = host_resolver.lookup(&host).await?;
    if let Some(addr) = addrs.iter().find(|addr| is_restricted_address(**addr, allow_loopback)) {
        tracing::warn!(%host, %addr, "refusing connection to restricted address");
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("{host} resolves to restricted address {addr}"),
        )
        .into());
    }
    let addrs = addrs.into_iter().map(|addr| SocketAddr::new(addr, 0)).collect::<Vec<_>>();
    Ok(Box::new(addrs.into_iter()))
}

/// Whether a request must not be sent to `addr`.
///
/// Covers private, shared (CGNAT), link-local, unspecified, broadcast and multicast ranges,
/// including their IPv4-mapped IPv6 forms. Loopback is only permitted with `allow_loopback`.
pub fn is_restricted_address(addr: IpAddr, allow_loopback: bool) -> bool {
    match addr {
        IpAddr::V4(v4) => is_restricted_v4(v4, allow_loopback),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_restricted_v4(v4, allow_loopback),
            None => is_restricted_v6(v6, allow_loopback),
        },
    }
}

fn is_restricted_v4(addr: Ipv4Addr, allow_loopback: bool) -> bool {
    let [a, b, ..] = addr.octets();
    (addr.is_loopback() && !allow_loopback)
        || addr.is_private()
        || addr.is_link_local()
        || addr.is_unspecified()
        || addr.is_broadcast()
        || addr.is_multicast()
        // 100.64.0.0/10
        || (a == 100 && (b & 0xc0) == 64)
        // 0.0.0.0/8
        || a == 0
}

fn is_restricted_v6(addr: Ipv6Addr, allow_loopback: bool) -> bool {
    let first = addr.segments()[0];
    (addr.is_loopback() && !allow_loopback)
        || addr.is_unspecified()
        || addr.is_multicast()
        // fc00::/7
        || (first & 0xfe00) == 0xfc00
        // fe80::/10
        || (first & 0xffc0) == 0xfe80
}
