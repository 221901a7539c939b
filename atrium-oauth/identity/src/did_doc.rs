//! Definitions for DID document types.
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

pub const PDS_SERVICE_ID: &str = "#atproto_pds";
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    /// JSON-LD context: a string, or an array of strings and objects.
    #[serde(rename = "@context")]
    pub context: Option<serde_json::Value>,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub also_known_as: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    pub r#type: String,
    pub controller: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub r#type: String,
    pub service_endpoint: String,
}

impl DidDocument {
    /// The endpoint of the first `#atproto_pds` service.
    ///
    /// With `strict`, the service must also have type `AtprotoPersonalDataServer`
    /// and an endpoint that parses as a URL.
    pub fn get_pds_endpoint(&self, strict: bool) -> Result<&str> {
        let service = self
            .service
            .iter()
            .flatten()
            .find(|service| service.id == PDS_SERVICE_ID)
            .ok_or(Error::NoPdsFound)?;
        if strict {
            if service.r#type != PDS_SERVICE_TYPE {
                return Err(Error::InvalidServiceType {
                    expected: PDS_SERVICE_TYPE,
                    got: service.r#type.clone(),
                });
            }
            Url::parse(&service.service_endpoint).map_err(Error::InvalidServiceEndpoint)?;
        }
        Ok(&service.service_endpoint)
    }
}
