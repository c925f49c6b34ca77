//! Provider Custom Resource Definition
//!
//! A `Provider` points at the secret holding Packet API credentials.

use crate::references::SecretKeySelector;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind name used in references to a `Provider`
pub const PROVIDER_KIND: &str = "Provider";

/// ProviderSpec configures access to the Packet API
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "packet.dcops.microscaler.io",
    version = "v1alpha1",
    kind = "Provider",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Secret key holding the credential blob, a JSON document of the form
    /// `{"apiKey": "...", "projectID": "..."}`
    pub credentials_secret_ref: SecretKeySelector,
}
