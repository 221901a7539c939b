#![doc = include_str!("../README.md")]
mod address;
mod client;
pub mod error;
mod hardened;

pub use self::address::{
    is_restricted_address, GuardedDnsResolver, HostResolver, SystemHostResolver,
};
pub use self::client::{DefaultHttpClient, HttpClient};
pub use self::error::{Error, Result};
pub use self::hardened::{
    HardenedHttpClient, HardenedHttpClientConfig, DEFAULT_CLIENT_TIMEOUT, DEFAULT_MAX_REDIRECTS,
};
pub use http;
