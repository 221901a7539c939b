#![doc = include_str!("../README.md")]
pub mod defaults;
pub mod did;
pub mod did_doc;
pub mod error;
mod fetcher;
pub mod handle;
mod types;

#[cfg(test)]
mod test_utils;

pub use self::did_doc::DidDocument;
pub use self::error::{Error, Result};
pub use self::fetcher::{DocumentFetcher, DocumentFetcherConfig, ResolvedIdentity};
pub use self::types::{is_did, Did};
