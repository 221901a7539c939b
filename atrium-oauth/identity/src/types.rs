//! Identifier types.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decentralized identifier, `did:<method>:<method-specific-id>`.
///
/// Resolvers hand back whatever the authority returned, so the grammar is only checked
/// when the method is needed, see [`Did::method`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn into_inner(self) -> String {
        self.0
    }
    /// Splits into the method and the method-specific id.
    pub fn parts(&self) -> Result<(&str, &str)> {
        let mut segments = self.0.splitn(3, ':');
        match (segments.next(), segments.next(), segments.next()) {
            (Some("did"), Some(method), Some(id)) => Ok((method, id)),
            (Some(_), Some(_), Some(_)) => {
                Err(Error::MalformedDid(format!("{}: first segment must be 'did'", self.0)))
            }
            _ => Err(Error::MalformedDid(format!("{}: not enough parts", self.0))),
        }
    }
    pub fn method(&self) -> Result<&str> {
        self.parts().map(|(method, _)| method)
    }
    pub fn method_specific_id(&self) -> Result<&str> {
        self.parts().map(|(_, id)| id)
    }
}

impl From<String> for Did {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Did {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `identifier` is already a DID rather than a handle.
pub fn is_did(identifier: &str) -> bool {
    identifier.starts_with("did:")
}

/// The host part of a handle, without the optional leading `@`.
pub fn handle_host(handle: &str) -> &str {
    handle.strip_prefix('@').unwrap_or(handle)
}
