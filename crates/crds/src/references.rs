//! Kubernetes object references used by the Packet CRDs
//!
//! Follows the Kubernetes `TypedLocalObjectReference` pattern with apiGroup, kind,
//! name, and optional namespace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group shared by every CRD in this crate
pub const API_GROUP: &str = "packet.dcops.microscaler.io";

/// Typed reference to another custom resource
///
/// - `apiGroup`: The API group of the referenced resource (e.g., "packet.dcops.microscaler.io")
/// - `kind`: The kind of the referenced resource (e.g., "Provider")
/// - `name`: The name of the referenced resource (required)
/// - `namespace`: The namespace of the referenced resource (optional, defaults to same namespace)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    /// API group of the referenced resource
    pub api_group: String,

    /// Kind of the referenced resource (e.g., "Provider")
    pub kind: String,

    /// Name of the referenced resource
    pub name: String,

    /// Namespace of the referenced resource (defaults to the referencing resource's namespace)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceReference {
    /// Reference to a `Provider` in the same namespace
    pub fn provider(name: impl Into<String>) -> Self {
        Self {
            api_group: API_GROUP.to_string(),
            kind: crate::provider::PROVIDER_KIND.to_string(),
            name: name.into(),
            namespace: None,
        }
    }

    /// Returns the namespace to resolve this reference in, falling back to `default_ns`
    pub fn namespace_or<'a>(&'a self, default_ns: &'a str) -> &'a str {
        self.namespace.as_deref().unwrap_or(default_ns)
    }
}

/// Selects a single key of a Kubernetes `Secret`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,

    /// Secret namespace (defaults to the namespace of the `Provider`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Key within the secret's data holding the credential blob
    pub key: String,
}
